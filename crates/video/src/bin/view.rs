use {
    base::{Vec2, default_level, init_file_logger, init_stdout_logger},
    com::StreamEndpoint,
    image::Scaling,
    minifb::{Key, KeyRepeat, Window, WindowOptions},
    std::time::Duration,
    video::*,
};

const DEFAULT_URL: &str = "127.0.0.1:8080";

const TITLE: &str = "MJPEG Stream - SPACE to start/stop, ESC to exit";

// height of the status strip below the picture
const BAR_HEIGHT: usize = 20;

const BAR_COLOR: [u8; 3] = [0, 0, 0];

// copy a BGRA buffer into the window buffer at row `top`, clipped
fn blit(dst: &mut [u32], dst_size: Vec2<usize>, top: usize, src: &[u8], src_size: Vec2<usize>) {
    let rows = src_size.y.min(dst_size.y.saturating_sub(top));
    let columns = src_size.x.min(dst_size.x);
    for y in 0..rows {
        let src_row = &src[y * src_size.x * 4..(y * src_size.x + columns) * 4];
        let dst_start = (top + y) * dst_size.x;
        for (dst, pixel) in dst[dst_start..dst_start + columns]
            .iter_mut()
            .zip(src_row.chunks_exact(4))
        {
            *dst = u32::from_le_bytes([pixel[0], pixel[1], pixel[2], 0]);
        }
    }
}

fn status_bar(width: usize, light: StatusLight, label: &str) -> Surface {
    let mut bar = Surface::filled(Vec2::new(width, BAR_HEIGHT), BAR_COLOR);
    for y in 4..16 {
        for x in 4..16 {
            bar.put_pixel(x, y, light.color);
        }
    }
    bar.draw_text(Vec2::new(24, 6), label, 1, [255, 255, 255]);
    bar
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::var_os("MJPEG_LOG_DIR") {
        Some(dir) => init_file_logger(dir, default_level())?,
        None => {
            init_stdout_logger(default_level());
        }
    }

    // view [--colorblind] [--exact] [--read-timeout-ms=N] host:port [path]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (flags, positional): (Vec<&String>, Vec<&String>) =
        args.iter().partition(|arg| arg.starts_with("--"));
    let has_flag = |name: &str| flags.iter().any(|flag| flag.as_str() == name);

    let url = positional.first().map_or(DEFAULT_URL, |arg| arg.as_str());
    let (endpoint, url_path) = StreamEndpoint::parse_url(url)?;
    let scaling = if has_flag("--exact") {
        Scaling::Exact
    } else {
        Scaling::Resize
    };
    let read_timeout = flags
        .iter()
        .find_map(|flag| flag.strip_prefix("--read-timeout-ms="))
        .map(|ms| ms.parse::<u64>().map(Duration::from_millis))
        .transpose()?;
    let mut config = StreamConfig::default()
        .with_endpoint(endpoint)
        .with_scaling(scaling)
        .with_read_timeout(read_timeout)
        .with_colorblind(has_flag("--colorblind"));
    if let Some(path) = positional.get(1).map(|arg| arg.to_string()).or(url_path) {
        config = config.with_path(path);
    }

    log::info!("MJPEG viewer");
    log::info!("source: {}{}", config.endpoint(), config.path());

    let mut view = StreamView::new(config)?;
    let size = view.size();
    let mut window = Window::new(
        TITLE,
        size.x,
        size.y + BAR_HEIGHT,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(view.config().tick_rate() as usize);

    view.start().await;

    let mut buffer: Vec<u32> = Vec::new();
    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            let running = view.toggle().await;
            log::info!("stream {}", if running { "started" } else { "stopped" });
        }

        let (width, height) = window.get_size();
        if width == 0 || height <= BAR_HEIGHT {
            window.update();
            continue;
        }
        let window_size = Vec2::new(width, height);
        let display = Vec2::new(width, height - BAR_HEIGHT);
        if display != view.size() {
            view.resize(display);
        }

        let tick = view.tick();
        buffer.clear();
        buffer.resize(width * height, 0);
        match &tick.paint {
            Paint::Background(surface) => {
                blit(&mut buffer, window_size, 0, surface.pixels(), surface.size())
            }
            Paint::Frame(frame) => blit(&mut buffer, window_size, 0, frame.pixels(), frame.size()),
        }
        let bar = status_bar(width, tick.light, tick.button_label);
        blit(&mut buffer, window_size, display.y, bar.pixels(), bar.size());

        window.update_with_buffer(&buffer, width, height)?;
    }

    view.shutdown().await;
    Ok(())
}
