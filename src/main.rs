use anyhow::{bail, Result};
use clap::{Arg, ArgAction, Command};
use log::{error, info};
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod app;
mod clip;
mod comparison;
mod diff;
mod gallery;
mod hover;
mod hud;
mod image_loader;
mod renderer;
mod view;

use crate::app::AppConfig;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("before_after_viewer")
        .version("1.0")
        .about("Before/after comparison viewer for paired image directories")
        .arg(
            Arg::new("before")
                .short('b')
                .long("before")
                .action(ArgAction::Set)
                .value_name("DIR")
                .help("Directory containing the before images")
                .required(true),
        )
        .arg(
            Arg::new("after")
                .short('a')
                .long("after")
                .action(ArgAction::Set)
                .value_name("DIR")
                .help("Directory containing the after images")
                .required(true),
        )
        .arg(
            Arg::new("manifest")
                .short('m')
                .long("manifest")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Caption manifest with 'stem | title | subtitle | company | details' lines"),
        )
        .arg(
            Arg::new("window_size")
                .short('w')
                .long("window-size")
                .action(ArgAction::Set)
                .value_name("WIDTHxHEIGHT")
                .help("Window size in format WIDTHxHEIGHT (e.g. 1920x1080)")
                .default_value("1920x1080"),
        )
        .arg(
            Arg::new("cache_size")
                .long("cache-size")
                .action(ArgAction::Set)
                .value_name("SIZE")
                .help("Maximum number of decoded images kept in memory")
                .default_value("50"),
        )
        .arg(
            Arg::new("preload_ahead")
                .long("preload-ahead")
                .action(ArgAction::Set)
                .value_name("COUNT")
                .help("Number of entries to preload ahead of the active one")
                .default_value("8"),
        )
        .arg(
            Arg::new("preload_behind")
                .long("preload-behind")
                .action(ArgAction::Set)
                .value_name("COUNT")
                .help("Number of entries to preload behind the active one")
                .default_value("8"),
        )
        .arg(
            Arg::new("load_threads")
                .long("load-threads")
                .action(ArgAction::Set)
                .value_name("COUNT")
                .help("Number of threads to use for decoding images")
                .default_value("4"),
        )
        .arg(
            Arg::new("initial_split")
                .long("initial-split")
                .action(ArgAction::Set)
                .value_name("PERCENT")
                .help("Initial split position as a percentage of the width")
                .default_value("50"),
        )
        .get_matches();

    let before_dir = matches.get_one::<String>("before").unwrap();
    let after_dir = matches.get_one::<String>("after").unwrap();
    let manifest = matches.get_one::<String>("manifest").cloned();
    let window_size = matches.get_one::<String>("window_size").unwrap();
    let cache_size = matches
        .get_one::<String>("cache_size")
        .unwrap()
        .parse()
        .unwrap_or(50);
    let preload_ahead = matches
        .get_one::<String>("preload_ahead")
        .unwrap()
        .parse()
        .unwrap_or(8);
    let preload_behind = matches
        .get_one::<String>("preload_behind")
        .unwrap()
        .parse()
        .unwrap_or(8);
    let load_threads = matches
        .get_one::<String>("load_threads")
        .unwrap()
        .parse()
        .unwrap_or(4);
    let initial_split: f32 = matches
        .get_one::<String>("initial_split")
        .unwrap()
        .parse()
        .unwrap_or(50.0);

    let (width, height) = parse_window_size(window_size)?;

    info!(
        "Starting viewer with before: {}, after: {}, window size: {}x{}",
        before_dir, after_dir, width, height
    );

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Before/After Viewer")
        .with_inner_size(winit::dpi::LogicalSize::new(width, height))
        .build(&event_loop)?;

    let app_config = AppConfig {
        before_dir: before_dir.to_string(),
        after_dir: after_dir.to_string(),
        manifest,
        cache_size,
        preload_ahead,
        preload_behind,
        load_threads,
        initial_split,
    };

    let mut app_state = pollster::block_on(app::AppState::new(&window, app_config))?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        app_state.handle_event(&window, &event);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => *control_flow = ControlFlow::Exit,
                _ => {}
            },
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            Event::RedrawRequested(_) => {
                app_state.update();
                match app_state.render(&window) {
                    Ok(_) => {}
                    Err(e) => error!("Render error: {}", e),
                }
            }
            _ => {}
        }
    });
}

fn parse_window_size(size: &str) -> Result<(f32, f32)> {
    let parts: Vec<&str> = size.split('x').collect();
    if parts.len() != 2 {
        bail!("Invalid window size format. Use WIDTHxHEIGHT");
    }
    let width = parts[0]
        .parse::<f32>()
        .map_err(|_| anyhow::anyhow!("Invalid width"))?;
    let height = parts[1]
        .parse::<f32>()
        .map_err(|_| anyhow::anyhow!("Invalid height"))?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::parse_window_size;

    #[test]
    fn window_size_parses_width_by_height() {
        assert_eq!(parse_window_size("1920x1080").unwrap(), (1920.0, 1080.0));
    }

    #[test]
    fn malformed_window_size_is_an_error() {
        assert!(parse_window_size("1920").is_err());
        assert!(parse_window_size("widexhigh").is_err());
        assert!(parse_window_size("1x2x3").is_err());
    }
}
