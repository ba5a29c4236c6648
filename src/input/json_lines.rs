// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/input/json_lines.rs - JSON 行输入
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

use std::fs::File;
use std::io::{BufRead, BufReader};

use thiserror::Error;
use tracing::{error, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::PalmFrame};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

/// 逐行读取 JSON 帧，适合从其他进程流式接收
pub struct JsonLinesInput {
  reader: Box<dyn BufRead>,
  line_number: usize,
}

impl FromUrlWithScheme for JsonLinesInput {
  const SCHEME: &'static str = "jsonl";
}

impl JsonLinesInput {
  pub const STDIN_SCHEME: &'static str = "stdin";

  pub fn new<R: BufRead + 'static>(reader: R) -> Self {
    Self {
      reader: Box::new(reader),
      line_number: 0,
    }
  }
}

impl FromUrl for JsonLinesInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      Self::STDIN_SCHEME => Ok(Self::new(std::io::stdin().lock())),
      Self::SCHEME => Ok(Self::new(BufReader::new(File::open(url.path())?))),
      other => {
        error!("URI scheme mismatch: found '{}'", other);
        Err(JsonLinesInputError::SchemaMismatch)
      }
    }
  }
}

impl Iterator for JsonLinesInput {
  type Item = PalmFrame;

  fn next(&mut self) -> Option<Self::Item> {
    let mut line = String::new();
    loop {
      line.clear();
      match self.reader.read_line(&mut line) {
        Ok(0) => return None,
        Ok(_) => {}
        Err(e) => {
          error!("读取输入失败: {}", e);
          return None;
        }
      }
      self.line_number += 1;

      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      match serde_json::from_str(trimmed) {
        Ok(frame) => return Some(frame),
        Err(e) => warn!("跳过第 {} 行无效帧: {}", self.line_number, e),
      }
    }
  }
}
