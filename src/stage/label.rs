// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/label.rs - 标签附加
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

use serde::{Deserialize, Serialize};

use crate::model::Detection;

/// 类别 id 到标签文本的映射，下标即类别 id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOptions {
  pub labels: Vec<String>,
}

impl Default for LabelOptions {
  fn default() -> Self {
    Self {
      labels: vec!["Palm".to_string()],
    }
  }
}

impl LabelOptions {
  pub fn label_for(&self, class_id: u32) -> Option<&str> {
    self.labels.get(class_id as usize).map(String::as_str)
  }
}

/// 为检测附加标签，未配置的类别保持原样
pub fn attach_labels(mut detections: Vec<Detection>, options: &LabelOptions) -> Vec<Detection> {
  for detection in detections.iter_mut() {
    if let Some(label) = options.label_for(detection.class_id) {
      detection.label = Some(label.to_string());
    }
  }
  detections
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_by_class_id() {
    let options = LabelOptions {
      labels: vec!["Palm".to_string(), "Fist".to_string()],
    };
    let detections = vec![
      Detection {
        class_id: 1,
        ..Detection::default()
      },
      Detection::default(),
      Detection {
        class_id: 7,
        ..Detection::default()
      },
    ];

    let labeled = attach_labels(detections, &options);
    assert_eq!(labeled[0].label.as_deref(), Some("Fist"));
    assert_eq!(labeled[1].label.as_deref(), Some("Palm"));
    assert_eq!(labeled[2].label, None);
  }
}
