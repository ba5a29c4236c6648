// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/input/tensor_file.rs - JSON 张量文件输入
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

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::PalmFrame};

#[derive(Error, Debug)]
pub enum TensorFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON error: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 文件内容可以是单帧对象，也可以是帧数组
#[derive(Deserialize)]
#[serde(untagged)]
enum FrameFile {
  Many(Vec<PalmFrame>),
  One(Box<PalmFrame>),
}

/// 从 JSON 文件一次性读取的张量帧
pub struct TensorFileInput {
  frames: std::vec::IntoIter<PalmFrame>,
}

impl FromUrlWithScheme for TensorFileInput {
  const SCHEME: &'static str = "tensors";
}

impl FromUrl for TensorFileInput {
  type Error = TensorFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(TensorFileInputError::SchemaMismatch);
    }

    let content = std::fs::read_to_string(url.path())?;
    let input = Self::from_json_str(&content)?;
    info!("从 {} 读取 {} 帧", url.path(), input.frames.len());
    Ok(input)
  }
}

impl TensorFileInput {
  pub fn from_json_str(content: &str) -> Result<Self, TensorFileInputError> {
    let frames = match serde_json::from_str(content)? {
      FrameFile::Many(frames) => frames,
      FrameFile::One(frame) => vec![*frame],
    };
    Ok(Self {
      frames: frames.into_iter(),
    })
  }
}

impl Iterator for TensorFileInput {
  type Item = PalmFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frames.next()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_single_frame_and_frame_arrays() {
    let single = r#"{"tensors": {"regressions": [1.0], "scores": [0.5]}}"#;
    assert_eq!(TensorFileInput::from_json_str(single).expect("valid").count(), 1);

    let many = format!("[{single}, {single}, {single}]");
    assert_eq!(TensorFileInput::from_json_str(&many).expect("valid").count(), 3);
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("image:///tmp/a.png").expect("valid url");
    assert!(matches!(
      TensorFileInput::from_url(&url),
      Err(TensorFileInputError::SchemaMismatch)
    ));
  }
}
