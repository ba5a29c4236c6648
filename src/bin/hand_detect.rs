// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/bin/hand_detect.rs - 连续手掌检测程序
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

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use shouzhang::{
  FromUrl,
  detector::HandDetectorBuilder,
  input::InputWrapper,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// 手掌检测后处理，持续处理输入帧
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测器配置，例如 palm:// 或 config:///path/to/config.json
  #[arg(long, value_name = "MODEL", default_value = "palm://")]
  pub model: Url,
  /// 输入来源，例如 tensors:///path/frames.json、jsonl:///path 或 stdin:
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 jsonl:- 或 record:///path/rects.txt
  #[arg(long, value_name = "OUTPUT", default_value = "jsonl:-")]
  pub output: Url,
  /// 处理帧数上限
  #[arg(long, value_name = "FRAMES")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt().with_writer(std::io::stderr).init();

  let args = Args::parse();

  info!("检测器配置: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input).context("无法打开输入来源")?;
  let detector = HandDetectorBuilder::from_url(&args.model)
    .and_then(HandDetectorBuilder::build)
    .context("无法构建手掌检测器")?;
  let output = OutputWrapper::from_url(&args.output).context("无法创建输出")?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .run_task(input, detector, output)?;

  Ok(())
}
