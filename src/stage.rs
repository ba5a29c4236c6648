// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage.rs - 后处理各阶段
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

//! 手掌检测后处理的各个阶段，按执行顺序排列：
//! 锚框生成、张量解码、非极大值抑制、标签、letterbox 去除、
//! 旋转矩形构建、矩形变换、数量截断以及可选的裁剪框。

pub mod anchors;
pub mod clip;
pub mod crop;
pub mod decode;
pub mod label;
pub mod letterbox;
pub mod nms;
pub mod rects;
pub mod transform;

pub use self::anchors::{Anchor, AnchorCache, AnchorError, AnchorOptions, generate_anchors};
pub use self::clip::clip_vector_size;
pub use self::crop::{CropOptions, crop_rect};
pub use self::decode::{DecodeError, DecoderOptions, decode_detections};
pub use self::label::{LabelOptions, attach_labels};
pub use self::letterbox::remove_letterbox;
pub use self::nms::{NmsAlgorithm, NmsOptions, OverlapType, Suppressed, suppress};
pub use self::rects::{RectError, RectOptions, detections_to_rects, normalize_radians};
pub use self::transform::{TransformOptions, transform_rect};
