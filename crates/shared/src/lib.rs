use serde::{Deserialize, Serialize};

mod transform;

pub use transform::{clamp_scale, CompositeTransform, MAX_SCALE, MIN_SCALE};

/// Цвет RGB (0-255)
pub type Rgb = [u8; 3];

/// Пресет окружения: фон сцены и вклад рассеянного света
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentPreset {
    /// Без фона: используется цвет очистки вьюпорта
    None,
    /// Нейтральный светло-серый фон
    #[default]
    Neutral,
    /// Тёмная студия с усиленным заполняющим светом
    Studio,
}

impl EnvironmentPreset {
    /// Все доступные пресеты
    pub fn all() -> &'static [EnvironmentPreset] {
        &[
            EnvironmentPreset::None,
            EnvironmentPreset::Neutral,
            EnvironmentPreset::Studio,
        ]
    }

    /// Отображаемое имя
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvironmentPreset::None => "None",
            EnvironmentPreset::Neutral => "Neutral",
            EnvironmentPreset::Studio => "Studio",
        }
    }

    /// Цвет фона сцены; `None` означает отсутствие фона
    pub fn background(&self) -> Option<Rgb> {
        match self {
            EnvironmentPreset::None => None,
            EnvironmentPreset::Neutral => Some([191, 191, 191]),
            EnvironmentPreset::Studio => Some([38, 40, 46]),
        }
    }

    /// Дополнительная интенсивность рассеянного света от окружения
    pub fn ambient_boost(&self) -> f32 {
        match self {
            EnvironmentPreset::None => 0.0,
            EnvironmentPreset::Neutral => 0.3,
            EnvironmentPreset::Studio => 0.5,
        }
    }
}

/// Тональная компрессия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    Linear,
    #[default]
    AcesFilmic,
    Reinhard,
}

impl ToneMapping {
    pub fn all() -> &'static [ToneMapping] {
        &[ToneMapping::Linear, ToneMapping::AcesFilmic, ToneMapping::Reinhard]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ToneMapping::Linear => "Linear",
            ToneMapping::AcesFilmic => "ACES Filmic",
            ToneMapping::Reinhard => "Reinhard",
        }
    }

    /// Код для шейдера
    pub fn shader_code(&self) -> i32 {
        match self {
            ToneMapping::Linear => 0,
            ToneMapping::AcesFilmic => 1,
            ToneMapping::Reinhard => 2,
        }
    }
}

/// Параметры просмотра модели
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Пресет окружения
    pub environment: EnvironmentPreset,
    /// Показывать сетку (и направляющие на холсте миниатюры)
    pub grid: bool,
    /// Экспозиция
    pub exposure: f32,
    /// Тональная компрессия
    pub tone_mapping: ToneMapping,
    /// Интенсивность рассеянного света
    pub ambient_intensity: f32,
    /// Цвет рассеянного света
    pub ambient_color: Rgb,
    /// Интенсивность направленного света
    pub direct_intensity: f32,
    /// Цвет направленного света
    pub direct_color: Rgb,
    /// Размер точек для точечных примитивов
    pub point_size: f32,
    /// Каркасный режим
    pub wireframe: bool,
    /// Показывать скелет
    pub skeleton: bool,
    /// Автоматическое вращение камеры
    pub auto_rotate: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            environment: EnvironmentPreset::default(),
            grid: true,
            exposure: 1.0,
            tone_mapping: ToneMapping::default(),
            ambient_intensity: 0.3,
            ambient_color: [255, 255, 255],
            direct_intensity: 2.5,
            direct_color: [255, 255, 255],
            point_size: 1.0,
            wireframe: false,
            skeleton: false,
            auto_rotate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_roundtrip_with_missing_fields() {
        let json = r#"{"grid": false, "exposure": 0.5}"#;
        let opts: ViewerOptions = serde_json::from_str(json).unwrap();
        assert!(!opts.grid);
        assert_eq!(opts.exposure, 0.5);
        assert_eq!(opts.environment, EnvironmentPreset::Neutral);
        assert_eq!(opts.point_size, 1.0);
    }

    #[test]
    fn none_environment_has_no_background() {
        assert!(EnvironmentPreset::None.background().is_none());
        assert!(EnvironmentPreset::Studio.background().is_some());
    }

    #[test]
    fn tone_mapping_serializes_snake_case() {
        let s = serde_json::to_string(&ToneMapping::AcesFilmic).unwrap();
        assert_eq!(s, "\"aces_filmic\"");
    }
}
