// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/task.rs - 任务执行方式
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  sync::mpsc,
  thread,
  time::{Duration, Instant},
};
use tracing::{info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始单帧任务");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    let now = Instant::now();
    let result = model.infer(&frame)?;
    let infer_elapsed = now.elapsed();
    output.render_result(&frame, &result)?;
    info!(
      "后处理耗时: {:.2?}，含输出耗时: {:.2?}",
      infer_elapsed,
      now.elapsed()
    );

    Ok(())
  }
}

/// 对同一帧重复推理，统计后处理耗时
pub struct RepeatShotTask {
  repeat_times: usize,
  warmup: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      repeat_times: 1000,
      warmup: 2,
    }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times;
    self
  }

  pub fn with_warmup(mut self, warmup: usize) -> Self {
    self.warmup = warmup;
    self
  }
}

/// 跳过预热轮次后的平均耗时；样本不足时返回 `None`
fn mean_after_warmup(times: &[Duration], warmup: usize) -> Option<Duration> {
  let measured = times.get(warmup..)?;
  if measured.is_empty() {
    return None;
  }
  let count = u32::try_from(measured.len()).ok()?;
  Some(measured.iter().sum::<Duration>() / count)
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始重复任务，共 {} 次", self.repeat_times);
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let elapsed = now.elapsed();
      output.render_result(&frame, &result)?;
      info!("({}) 后处理耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
    }

    match mean_after_warmup(&times, self.warmup) {
      Some(mean) => warn!(
        "平均后处理时间: {:.2?}（跳过前 {} 次）",
        mean, self.warmup
      ),
      None => warn!("重复次数不足，无法统计平均时间"),
    }

    Ok(())
  }
}

/// 持续处理输入直到耗尽、达到帧数上限或收到中断信号
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始连续任务");
    let (tx, rx) = mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let mut frame_index = 0usize;
    for frame in input {
      frame_index = frame_index.wrapping_add(1);
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let infer_elapsed = now.elapsed();
      output.render_result(&frame, &result)?;
      info!(
        "第 {} 帧完成，后处理 {:.2?} / 含输出 {:.2?}",
        frame_index,
        infer_elapsed,
        now.elapsed()
      );
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}，退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共处理 {} 帧", frame_index);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::convert::Infallible;

  struct Doubler;

  impl Model for Doubler {
    type Input = u32;
    type Output = u32;
    type Error = Infallible;

    fn infer(&self, input: &u32) -> Result<u32, Infallible> {
      Ok(input * 2)
    }
  }

  #[derive(Default)]
  struct Collect(RefCell<Vec<u32>>);

  impl Render<u32, u32> for &Collect {
    type Error = Infallible;

    fn render_result(&self, _frame: &u32, result: &u32) -> Result<(), Infallible> {
      self.0.borrow_mut().push(*result);
      Ok(())
    }
  }

  #[test]
  fn one_shot_renders_first_frame_only() {
    let sink = Collect::default();
    OneShotTask
      .run_task(vec![1u32, 2, 3].into_iter(), Doubler, &sink)
      .expect("task succeeds");
    assert_eq!(*sink.0.borrow(), vec![2]);
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let sink = Collect::default();
    assert!(
      OneShotTask
        .run_task(std::iter::empty::<u32>(), Doubler, &sink)
        .is_err()
    );
  }

  #[test]
  fn repeat_shot_runs_requested_times() {
    let sink = Collect::default();
    RepeatShotTask::default()
      .with_repeat_times(5)
      .with_warmup(1)
      .run_task(vec![4u32].into_iter(), Doubler, &sink)
      .expect("task succeeds");
    assert_eq!(*sink.0.borrow(), vec![8; 5]);
  }

  #[test]
  fn mean_skips_warmup() {
    let times = [
      Duration::from_millis(100),
      Duration::from_millis(2),
      Duration::from_millis(4),
    ];
    assert_eq!(mean_after_warmup(&times, 1), Some(Duration::from_millis(3)));
    assert_eq!(mean_after_warmup(&times, 3), None);
    assert_eq!(mean_after_warmup(&times, 5), None);
  }
}
