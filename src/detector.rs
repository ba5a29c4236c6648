// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/detector.rs - 手掌检测后处理流水线
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
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl,
  config::{ConfigError, HandDetectorConfig},
  frame::{PaddingError, PalmFrame},
  model::{HandDetectResult, ImageSize, Model},
  stage::{
    AnchorCache, AnchorError, DecodeError, RectError, Suppressed, attach_labels, clip_vector_size,
    crop_rect, decode_detections, detections_to_rects, remove_letterbox, suppress,
    transform_rect,
  },
};

const PALM_SCHEME: &str = "palm";
const CONFIG_SCHEME: &str = "config";

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("模型地址必须使用 palm 或 config 方案，实际为 {0}")]
  SchemeMismatch(String),
  #[error("参数 {key} 的值无效: {value}")]
  InvalidQuery { key: String, value: String },
  #[error("锚框错误: {0}")]
  Anchor(#[from] AnchorError),
  #[error("解码错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("图像尺寸不能为 0: {0:?}")]
  EmptyImageSize(ImageSize),
  #[error("letterbox 错误: {0}")]
  Padding(#[from] PaddingError),
  #[error("矩形构建错误: {0}")]
  Rect(#[from] RectError),
}

/// 手掌检测后处理流水线
///
/// 锚框在第一次推理时生成，之后只读复用；其余阶段不保留任何跨帧状态，
/// 同一个检测器可以在多个线程间共享。
#[derive(Debug)]
pub struct HandDetector {
  config: HandDetectorConfig,
  anchors: AnchorCache,
}

#[derive(Debug, Clone, Default)]
pub struct HandDetectorBuilder {
  config: HandDetectorConfig,
}

impl FromUrl for HandDetectorBuilder {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let config = match url.scheme() {
      PALM_SCHEME => HandDetectorConfig::default(),
      CONFIG_SCHEME => HandDetectorConfig::from_path(url.path())?,
      other => return Err(DetectorError::SchemeMismatch(other.to_string())),
    };

    let mut builder = HandDetectorBuilder { config };
    for (key, value) in url.query_pairs() {
      builder = builder.apply_query(&key, &value)?;
    }
    Ok(builder)
  }
}

fn parse_query<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DetectorError> {
  value.parse().map_err(|_| DetectorError::InvalidQuery {
    key: key.to_string(),
    value: value.to_string(),
  })
}

impl HandDetectorBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn config(mut self, config: HandDetectorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn num_hands(mut self, num_hands: usize) -> Self {
    self.config.num_hands = num_hands;
    self
  }

  pub fn min_score(mut self, min_score: f32) -> Self {
    self.config.decoder.min_score_thresh = min_score;
    self
  }

  fn apply_query(mut self, key: &str, value: &str) -> Result<Self, DetectorError> {
    match key {
      "num_hands" => self.config.num_hands = parse_query(key, value)?,
      "min_score" => self.config.decoder.min_score_thresh = parse_query(key, value)?,
      "nms_threshold" => self.config.nms.min_suppression_threshold = parse_query(key, value)?,
      "return_empty" => self.config.nms.return_empty_detections = parse_query(key, value)?,
      "zero_rect" => {
        self.config.rects.output_zero_rect_for_empty_detections = parse_query(key, value)?
      }
      _ => warn!("忽略未知参数: {}={}", key, value),
    }
    Ok(self)
  }

  pub fn build(self) -> Result<HandDetector, DetectorError> {
    info!("校验手掌检测配置");
    self.config.validate()?;
    info!(
      "检测器就绪: {} 个锚框, 最多 {} 只手",
      self.config.decoder.num_boxes, self.config.num_hands
    );

    Ok(HandDetector {
      anchors: AnchorCache::new(self.config.anchors.clone()),
      config: self.config,
    })
  }
}

impl HandDetector {
  pub fn config(&self) -> &HandDetectorConfig {
    &self.config
  }
}

impl Model for HandDetector {
  type Input = PalmFrame;
  type Output = HandDetectResult;
  type Error = DetectorError;

  fn infer(&self, frame: &Self::Input) -> Result<Self::Output, Self::Error> {
    let config = &self.config;
    if let Some(size) = frame.image_size.filter(ImageSize::is_empty) {
      error!("图像尺寸无效: {}x{}", size.width, size.height);
      return Err(DetectorError::EmptyImageSize(size));
    }
    let anchors = self.anchors.get()?;

    let detections = decode_detections(&frame.tensors, &anchors, &config.decoder)?;
    let detections = match suppress(detections, &config.nms) {
      Suppressed::Detections(detections) => detections,
      Suppressed::Skipped => {
        debug!("本帧无检测，跳过矩形构建");
        return Ok(HandDetectResult::default());
      }
    };
    let detections = attach_labels(detections, &config.labels);
    let detections = remove_letterbox(detections, &frame.padding)?;

    let rects: Vec<_> = detections_to_rects(&detections, frame.image_size, &config.rects)?
      .into_iter()
      .map(|rect| transform_rect(rect, frame.image_size, &config.transform))
      .collect();
    let mut rects = clip_vector_size(rects, config.num_hands);
    // 零矩形表示本帧为空，不参与裁剪
    if let Some(crop) = config.crop.as_ref().filter(|_| !detections.is_empty()) {
      rects = rects.into_iter().map(|rect| crop_rect(rect, crop)).collect();
    }

    debug!("检测到 {} 个手掌, 输出 {} 个矩形", detections.len(), rects.len());
    Ok(HandDetectResult {
      detections: detections.into_boxed_slice(),
      rects: rects.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn palm_url_applies_overrides() {
    let url = Url::parse("palm:?num_hands=1&min_score=0.7&return_empty=false").expect("valid url");
    let detector = HandDetectorBuilder::from_url(&url)
      .expect("known scheme")
      .build()
      .expect("valid config");
    assert_eq!(detector.config().num_hands, 1);
    assert_eq!(detector.config().decoder.min_score_thresh, 0.7);
    assert!(!detector.config().nms.return_empty_detections);
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("tflite:///palm_detection.tflite").expect("valid url");
    assert!(matches!(
      HandDetectorBuilder::from_url(&url),
      Err(DetectorError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn bad_query_value_is_rejected() {
    let url = Url::parse("palm:?num_hands=two").expect("valid url");
    assert!(matches!(
      HandDetectorBuilder::from_url(&url),
      Err(DetectorError::InvalidQuery { .. })
    ));
  }

  #[test]
  fn invalid_config_fails_at_build() {
    let result = HandDetectorBuilder::new().num_hands(0).build();
    assert!(matches!(
      result,
      Err(DetectorError::Config(ConfigError::ZeroHands))
    ));
  }

  #[test]
  fn detector_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HandDetector>();
  }
}
