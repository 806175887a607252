use serde::{Deserialize, Serialize};

/// Минимальный масштаб снимка на холсте
pub const MIN_SCALE: f32 = 0.3;
/// Максимальный масштаб снимка на холсте
pub const MAX_SCALE: f32 = 3.0;

/// Ограничить масштаб диапазоном `[MIN_SCALE, MAX_SCALE]`.
/// NaN превращается в единичный масштаб.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Смещение и масштаб снимка на холсте композиции
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeTransform {
    /// Смещение по X в пикселях холста
    pub offset_x: f32,
    /// Смещение по Y в пикселях холста
    pub offset_y: f32,
    /// Множитель масштаба, всегда в `[MIN_SCALE, MAX_SCALE]`
    pub scale: f32,
}

impl Default for CompositeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CompositeTransform {
    pub const IDENTITY: CompositeTransform = CompositeTransform {
        offset_x: 0.0,
        offset_y: 0.0,
        scale: 1.0,
    };

    /// Создать трансформацию; масштаб ограничивается, а не отвергается
    pub fn new(offset_x: f32, offset_y: f32, scale: f32) -> Self {
        Self {
            offset_x,
            offset_y,
            scale: clamp_scale(scale),
        }
    }

    /// Та же трансформация с ограниченным масштабом
    pub fn clamped(self) -> Self {
        Self::new(self.offset_x, self.offset_y, self.scale)
    }

    pub fn with_offset(self, offset_x: f32, offset_y: f32) -> Self {
        Self {
            offset_x,
            offset_y,
            ..self
        }
    }

    pub fn with_scale(self, scale: f32) -> Self {
        Self {
            scale: clamp_scale(scale),
            ..self
        }
    }

    /// Изменить масштаб на `delta` с ограничением
    pub fn zoomed_by(self, delta: f32) -> Self {
        self.with_scale(self.scale + delta)
    }

    pub fn offset(&self) -> [f32; 2] {
        [self.offset_x, self.offset_y]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_scale() {
        assert_eq!(CompositeTransform::new(0.0, 0.0, 10.0).scale, MAX_SCALE);
        assert_eq!(CompositeTransform::new(0.0, 0.0, 0.0).scale, MIN_SCALE);
        assert_eq!(CompositeTransform::new(0.0, 0.0, f32::NAN).scale, 1.0);
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut t = CompositeTransform::IDENTITY;
        for _ in 0..500 {
            t = t.zoomed_by(0.025);
        }
        assert_eq!(t.scale, MAX_SCALE);
        for _ in 0..500 {
            t = t.zoomed_by(-0.025);
        }
        assert_eq!(t.scale, MIN_SCALE);
    }

    #[test]
    fn default_is_identity() {
        assert!(CompositeTransform::default().is_identity());
        assert!(!CompositeTransform::new(1.0, 0.0, 1.0).is_identity());
    }
}
