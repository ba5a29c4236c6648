// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/input.rs - 输入来源
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::PalmFrame};

mod json_lines;
mod tensor_file;

pub use self::json_lines::{JsonLinesInput, JsonLinesInputError};
pub use self::tensor_file::{TensorFileInput, TensorFileInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("张量文件输入错误: {0}")]
  TensorFileInputError(#[from] TensorFileInputError),
  #[error("JSON 行输入错误: {0}")]
  JsonLinesInputError(#[from] JsonLinesInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  TensorFile(TensorFileInput),
  JsonLines(JsonLinesInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      TensorFileInput::SCHEME => Ok(InputWrapper::TensorFile(TensorFileInput::from_url(url)?)),
      JsonLinesInput::SCHEME | JsonLinesInput::STDIN_SCHEME => {
        Ok(InputWrapper::JsonLines(JsonLinesInput::from_url(url)?))
      }
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = PalmFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::TensorFile(input) => input.next(),
      InputWrapper::JsonLines(input) => input.next(),
    }
  }
}
