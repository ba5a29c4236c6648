// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/output/record.rs - 矩形文本记录输出
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

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::PalmFrame,
  model::{HandDetectResult, NormalizedRect},
  output::Render,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("输出锁已损坏")]
  Poisoned,
}

struct RecordState {
  file: File,
  frame_counter: usize,
}

/// 以文本记录每个矩形: `帧号, 序号, x_center, y_center, width, height, rotation`
///
/// 带 `?append` 参数时追加到已有文件。
pub struct RecordOutput {
  state: Mutex<RecordState>,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let append = url.query_pairs().any(|(k, _)| k == "append");
    let file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(append)
      .truncate(!append)
      .open(url.path())?;

    Ok(RecordOutput {
      state: Mutex::new(RecordState {
        file,
        frame_counter: 0,
      }),
    })
  }
}

fn format_record(frame: usize, index: usize, rect: &NormalizedRect) -> String {
  format!(
    "{}, {}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
    frame, index, rect.x_center, rect.y_center, rect.width, rect.height, rect.rotation
  )
}

impl Render<PalmFrame, HandDetectResult> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, _frame: &PalmFrame, result: &HandDetectResult) -> Result<(), Self::Error> {
    let mut state = self.state.lock().map_err(|_| RecordOutputError::Poisoned)?;
    let frame = state.frame_counter;
    for (index, rect) in result.rects.iter().enumerate() {
      writeln!(state.file, "{}", format_record(frame, index, rect))?;
    }
    state.frame_counter += 1;
    Ok(())
  }
}
