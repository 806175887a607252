pub mod settings;

pub use settings::{
    AppSettings, CaptureSettings, CompositeSettings, IndicatorSettings, Language, UiSettings,
    ViewportSettings,
};

use shared::ViewerOptions;

use crate::session::ViewerSession;

/// Panel visibility flags
pub struct PanelVisibility {
    pub options: bool,
    pub thumbnail: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            options: true,
            thumbnail: true,
        }
    }
}

/// Top-level application state shared by the UI panels
pub struct AppState {
    pub session: ViewerSession,
    pub settings: AppSettings,
    pub panels: PanelVisibility,
    pub show_settings_window: bool,
    /// Bumped whenever persisted settings change
    settings_version: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            session: ViewerSession::new(&settings),
            settings,
            panels: PanelVisibility::default(),
            show_settings_window: false,
            settings_version: 0,
        }
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    /// Mark settings dirty after a direct edit
    pub fn touch_settings(&mut self) {
        self.settings_version += 1;
    }

    /// Push new viewer options to the session and remember them
    pub fn set_options(&mut self, options: ViewerOptions) {
        if options == self.settings.options {
            return;
        }
        self.settings.options = options.clone();
        self.session.set_options(options);
        self.touch_settings();
    }

    pub fn set_language(&mut self, language: Language) {
        if self.settings.ui.language != language {
            self.settings.ui.language = language;
            self.touch_settings();
        }
    }

    /// Opacity is baked into the guide, so it is reloaded from disk
    pub fn set_guide_opacity(&mut self, opacity: f32) {
        self.settings.composite.guide_opacity = opacity;
        self.session.canvas.set_guide_opacity(opacity);
        if let Some(path) = &self.settings.composite.guide_path {
            self.session.canvas.load_guide(path);
        }
        self.touch_settings();
    }

    /// Load a guide overlay and remember its path when it decodes
    pub fn set_guide_path(&mut self, path: std::path::PathBuf) -> bool {
        let loaded = self.session.canvas.load_guide(&path);
        if loaded {
            self.settings.composite.guide_path = Some(path);
            self.touch_settings();
        }
        loaded
    }

    pub fn clear_guide(&mut self) {
        self.session.canvas.set_guide(None);
        if self.settings.composite.guide_path.take().is_some() {
            self.touch_settings();
        }
    }
}
