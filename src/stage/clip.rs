// 该文件是 Shouzhang （手掌） 项目的一部分。
// src/stage/clip.rs - 结果数量限制
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

/// 截断到至多 `max_count` 个元素，保持原有顺序
pub fn clip_vector_size<T>(mut items: Vec<T>, max_count: usize) -> Vec<T> {
  items.truncate(max_count);
  items
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::NormalizedRect;

  fn rects(n: usize) -> Vec<NormalizedRect> {
    (0..n)
      .map(|i| NormalizedRect {
        x_center: i as f32 / 10.0,
        ..NormalizedRect::ZERO
      })
      .collect()
  }

  #[test]
  fn keeps_leading_items_in_order() {
    let input = rects(5);
    let clipped = clip_vector_size(input.clone(), 2);
    assert_eq!(clipped, input[..2].to_vec());
  }

  #[test]
  fn passes_through_when_short_enough() {
    let input = rects(5);
    assert_eq!(clip_vector_size(input.clone(), 5), input);
    assert_eq!(clip_vector_size(input.clone(), 9), input);
  }
}
