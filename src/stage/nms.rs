// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/nms.rs - 非极大值抑制
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
use tracing::debug;

use crate::model::{BoundingBox, Detection, Keypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapType {
  /// 交集 / 外接矩形面积
  Jaccard,
  /// 交集 / 候选框面积
  ModifiedJaccard,
  IntersectionOverUnion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NmsAlgorithm {
  /// 丢弃被抑制的候选，只保留得分最高者的框
  Standard,
  /// 按得分加权平均被合并的候选
  Weighted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmsOptions {
  pub min_suppression_threshold: f32,
  pub overlap_type: OverlapType,
  pub algorithm: NmsAlgorithm,
  pub return_empty_detections: bool,
  pub max_num_detections: Option<usize>,
  pub min_score_threshold: Option<f32>,
}

impl Default for NmsOptions {
  fn default() -> Self {
    Self {
      min_suppression_threshold: 0.3,
      overlap_type: OverlapType::IntersectionOverUnion,
      algorithm: NmsAlgorithm::Weighted,
      return_empty_detections: true,
      max_num_detections: None,
      min_score_threshold: None,
    }
  }
}

/// 抑制结果，区分“输出空列表”和“本帧跳过后续阶段”
#[derive(Debug, Clone, PartialEq)]
pub enum Suppressed {
  Detections(Vec<Detection>),
  /// 输入为空且未开启 `return_empty_detections`
  Skipped,
}

impl Suppressed {
  pub fn into_detections(self) -> Option<Vec<Detection>> {
    match self {
      Suppressed::Detections(detections) => Some(detections),
      Suppressed::Skipped => None,
    }
  }
}

/// 两个框的重叠相似度，分母为 0 时返回 0
pub fn overlap_similarity(
  overlap_type: OverlapType,
  anchor: &BoundingBox,
  candidate: &BoundingBox,
) -> f32 {
  let intersection = anchor.intersection_area(candidate);
  let normalization = match overlap_type {
    OverlapType::Jaccard => anchor.enclosing_area(candidate),
    OverlapType::ModifiedJaccard => candidate.area(),
    OverlapType::IntersectionOverUnion => anchor.area() + candidate.area() - intersection,
  };

  if normalization > 0.0 {
    intersection / normalization
  } else {
    0.0
  }
}

/// 非极大值抑制
///
/// 候选按得分降序稳定排序，同分时保持输入顺序。每轮取出剩余最高分者，
/// 与其重叠度不低于阈值的候选被合并（加权）或丢弃（标准）。
/// 加权合并按“锚点检测在前，其余按排序顺序”累加。
pub fn suppress(detections: Vec<Detection>, options: &NmsOptions) -> Suppressed {
  let mut remaining: Vec<Detection> = match options.min_score_threshold {
    Some(thresh) => detections.into_iter().filter(|d| d.score >= thresh).collect(),
    None => detections,
  };

  if remaining.is_empty() {
    debug!("NMS 输入为空");
    return if options.return_empty_detections {
      Suppressed::Detections(Vec::new())
    } else {
      Suppressed::Skipped
    };
  }

  remaining.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut output = Vec::new();
  while !remaining.is_empty() {
    if options
      .max_num_detections
      .is_some_and(|max| output.len() >= max)
    {
      break;
    }

    let anchor = remaining.remove(0);
    let (matched, rest): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|candidate| {
      overlap_similarity(options.overlap_type, &anchor.bbox, &candidate.bbox)
        >= options.min_suppression_threshold
    });
    remaining = rest;

    let detection = match options.algorithm {
      NmsAlgorithm::Standard => anchor,
      NmsAlgorithm::Weighted => weighted_merge(anchor, &matched),
    };
    output.push(detection);
  }

  debug!("NMS 后剩余 {} 个检测", output.len());
  Suppressed::Detections(output)
}

fn weighted_merge(anchor: Detection, matched: &[Detection]) -> Detection {
  if matched.is_empty() {
    return anchor;
  }

  let mut total_score = 0.0;
  let mut max_score = anchor.score;
  let mut x_center = 0.0;
  let mut y_center = 0.0;
  let mut width = 0.0;
  let mut height = 0.0;
  let mut keypoints = vec![Keypoint::default(); anchor.keypoints.len()];

  for detection in std::iter::once(&anchor).chain(matched) {
    let weight = detection.score;
    total_score += weight;
    max_score = max_score.max(weight);
    x_center += detection.bbox.x_center * weight;
    y_center += detection.bbox.y_center * weight;
    width += detection.bbox.width * weight;
    height += detection.bbox.height * weight;
    for (sum, keypoint) in keypoints.iter_mut().zip(&detection.keypoints) {
      sum.x += keypoint.x * weight;
      sum.y += keypoint.y * weight;
    }
  }

  if total_score <= 0.0 {
    return anchor;
  }

  for keypoint in keypoints.iter_mut() {
    keypoint.x /= total_score;
    keypoint.y /= total_score;
  }

  Detection {
    score: max_score,
    bbox: BoundingBox {
      x_center: x_center / total_score,
      y_center: y_center / total_score,
      width: width / total_score,
      height: height / total_score,
    },
    keypoints,
    ..anchor
  }
}
