mod app;
pub mod i18n;
mod ui;
mod viewport;

// Re-export library modules so that `crate::session`, `crate::state`, etc.
// resolve to the lib crate types everywhere in the binary.
pub use modelshot_gui_lib::asset;
pub use modelshot_gui_lib::capture;
pub use modelshot_gui_lib::export;
pub use modelshot_gui_lib::interaction;
pub use modelshot_gui_lib::session;
pub use modelshot_gui_lib::state;

use std::path::PathBuf;

use app::ModelshotApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelshot_gui=info,modelshot_gui_lib=info".into()),
        )
        .init();

    // Parse --model <path> argument
    let initial_model = parse_model_arg(std::env::args().skip(1));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Modelshot: GLTF viewer")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 560.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "modelshot-gui",
        native_options,
        Box::new(move |cc| Ok(Box::new(ModelshotApp::new(cc, initial_model)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_model_arg(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--model" {
            let path = args.next();
            if path.is_none() {
                tracing::error!("--model expects a path");
            }
            return path.map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn model_arg_is_parsed() {
        assert_eq!(
            parse_model_arg(args(&["--verbose", "--model", "scene.glb"])),
            Some(PathBuf::from("scene.glb"))
        );
        assert_eq!(parse_model_arg(args(&["--model"])), None);
        assert_eq!(parse_model_arg(args(&[])), None);
    }
}
