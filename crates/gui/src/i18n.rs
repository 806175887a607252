use std::sync::atomic::{AtomicU8, Ordering};

use crate::state::Language;

static CURRENT_LANG: AtomicU8 = AtomicU8::new(0); // 0=Ru (default)

pub fn lang() -> Language {
    match CURRENT_LANG.load(Ordering::Relaxed) {
        1 => Language::En,
        _ => Language::Ru,
    }
}

pub fn set_lang(l: Language) {
    CURRENT_LANG.store(
        match l {
            Language::Ru => 0,
            Language::En => 1,
        },
        Ordering::Relaxed,
    );
}

/// Translate a key to the current language.
pub fn t(key: &str) -> &'static str {
    let ru = lang() == Language::Ru;
    match key {
        // ── Main menus ──────────────────────────────────────
        "menu.file" => if ru { "Файл" } else { "File" },
        "menu.open" => if ru { "Открыть модель...  Ctrl+O" } else { "Open model...  Ctrl+O" },
        "menu.open_title" => if ru { "Открыть GLTF/GLB" } else { "Open GLTF/GLB" },
        "menu.save_thumbnail" => if ru { "Сохранить миниатюру...  Ctrl+S" } else { "Save thumbnail...  Ctrl+S" },
        "menu.save_title" => if ru { "Сохранить PNG" } else { "Save PNG" },
        "menu.quit" => if ru { "Выход" } else { "Quit" },

        "menu.view" => if ru { "Вид" } else { "View" },
        "menu.options" => if ru { "Параметры" } else { "Options" },
        "menu.thumbnail" => if ru { "Миниатюра" } else { "Thumbnail" },
        "menu.reset_camera" => if ru { "Сбросить камеру  Home" } else { "Reset camera  Home" },
        "menu.reset_view" => if ru { "Сбросить кадр  0" } else { "Reset framing  0" },
        "menu.camera_info" => if ru { "Данные камеры" } else { "Camera info" },
        "menu.indicator" => if ru { "Индикатор осей" } else { "Axis indicator" },
        "menu.language" => if ru { "Язык" } else { "Language" },

        "menu.settings" => if ru { "Настройки" } else { "Settings" },
        "menu.preferences" => if ru { "Параметры приложения..." } else { "Preferences..." },

        // ── Toolbar ─────────────────────────────────────────
        "tb.open" => if ru { "Открыть" } else { "Open" },
        "tb.reset_camera" => if ru { "Камера" } else { "Camera" },
        "tb.use_snapshot" => if ru { "Снимок" } else { "Snapshot" },

        // ── Settings window ─────────────────────────────────
        "settings.title" => if ru { "Настройки" } else { "Settings" },
        "settings.viewport" => if ru { "Вьюпорт" } else { "Viewport" },
        "settings.grid_range" => if ru { "Размер сетки" } else { "Grid range" },
        "settings.grid_cell" => if ru { "Шаг сетки" } else { "Grid cell" },
        "settings.grid_opacity" => if ru { "Прозрачность сетки" } else { "Grid opacity" },
        "settings.surface_size" => if ru { "Разрешение (после перезапуска)" } else { "Resolution (after restart)" },
        "settings.capture" => if ru { "Захват" } else { "Capture" },
        "settings.throttle" => if ru { "Интервал снимков" } else { "Capture interval" },
        "settings.composite" => if ru { "Миниатюра" } else { "Thumbnail" },
        "settings.background" => if ru { "Фон" } else { "Background" },
        "settings.indicator" => if ru { "Индикатор осей" } else { "Axis indicator" },
        "settings.indicator_distance" => if ru { "Дистанция" } else { "Distance" },
        "settings.ui" => if ru { "Интерфейс" } else { "Interface" },
        "settings.font_size" => if ru { "Размер шрифта" } else { "Font size" },
        "settings.apply" => if ru { "Сохранить" } else { "Save" },
        "settings.reset" => if ru { "По умолчанию" } else { "Defaults" },
        "settings.close" => if ru { "Закрыть" } else { "Close" },

        // ── Options panel ───────────────────────────────────
        "opt.title" => if ru { "Параметры" } else { "Options" },
        "opt.scene" => if ru { "Сцена" } else { "Scene" },
        "opt.environment" => if ru { "Окружение" } else { "Environment" },
        "opt.grid" => if ru { "Сетка" } else { "Grid" },
        "opt.auto_rotate" => if ru { "Автовращение" } else { "Auto-rotate" },
        "opt.wireframe" => if ru { "Каркас" } else { "Wireframe" },
        "opt.skeleton" => if ru { "Скелет" } else { "Skeleton" },
        "opt.point_size" => if ru { "Размер точек" } else { "Point size" },
        "opt.lighting" => if ru { "Освещение" } else { "Lighting" },
        "opt.exposure" => if ru { "Экспозиция" } else { "Exposure" },
        "opt.tone_mapping" => if ru { "Тональная компрессия" } else { "Tone mapping" },
        "opt.ambient" => if ru { "Рассеянный свет" } else { "Ambient light" },
        "opt.direct" => if ru { "Направленный свет" } else { "Direct light" },
        "opt.intensity" => if ru { "Интенсивность" } else { "Intensity" },
        "opt.color" => if ru { "Цвет" } else { "Color" },
        "opt.guide" => if ru { "Направляющая" } else { "Guide" },
        "opt.guide_load" => if ru { "Загрузить..." } else { "Load..." },
        "opt.guide_clear" => if ru { "Убрать" } else { "Remove" },
        "opt.guide_title" => if ru { "Изображение направляющей" } else { "Guide image" },
        "opt.guide_opacity" => if ru { "Прозрачность" } else { "Opacity" },
        "opt.guide_none" => if ru { "нет" } else { "none" },
        "opt.guide_failed" => if ru { "Не удалось загрузить направляющую" } else { "Failed to load guide" },

        // ── Asset info ──────────────────────────────────────
        "info.title" => if ru { "Модель" } else { "Model" },
        "info.nodes" => if ru { "Узлы" } else { "Nodes" },
        "info.vertices" => if ru { "Вершины" } else { "Vertices" },
        "info.meshes" => if ru { "Меши" } else { "Meshes" },
        "info.animations" => if ru { "Анимации" } else { "Animations" },
        "info.scale" => if ru { "Масштаб" } else { "Scale" },
        "info.none" => if ru { "Модель не загружена" } else { "No model loaded" },

        // ── Thumbnail panel ─────────────────────────────────
        "thumb.title" => if ru { "Миниатюра" } else { "Thumbnail" },
        "thumb.use" => if ru { "Использовать снимок  Space" } else { "Use snapshot  Space" },
        "thumb.reset" => if ru { "Сбросить кадр" } else { "Reset framing" },
        "thumb.current" => if ru { "Текущая миниатюра" } else { "Current thumbnail" },
        "thumb.save" => if ru { "Сохранить PNG..." } else { "Save PNG..." },
        "thumb.copy_uri" => if ru { "Копировать data URI" } else { "Copy data URI" },
        "thumb.copied" => if ru { "Data URI скопирован" } else { "Data URI copied" },
        "thumb.saved" => if ru { "Миниатюра сохранена" } else { "Thumbnail saved" },
        "thumb.empty" => if ru { "Снимок ещё не сделан" } else { "No snapshot yet" },
        "thumb.hint" => if ru { "Перетаскивание: сдвиг, колесо: масштаб" } else { "Drag: move, wheel: scale" },

        // ── Viewport ────────────────────────────────────────
        "vp.no_gl" => if ru { "OpenGL недоступен" } else { "OpenGL unavailable" },
        "vp.drop_hint" => if ru { "Откройте файл .glb или .gltf" } else { "Open a .glb or .gltf file" },

        // ── Status bar ──────────────────────────────────────
        "status.empty" => if ru { "Нет модели" } else { "No model" },
        "status.loading" => if ru { "Загрузка" } else { "Loading" },
        "status.loaded" => if ru { "Загружено" } else { "Loaded" },
        "status.error" => if ru { "Ошибка" } else { "Error" },
        "status.interacting" => if ru { "взаимодействие" } else { "interacting" },
        "status.captures" => if ru { "Снимки" } else { "Captures" },

        _ => "???",
    }
}
