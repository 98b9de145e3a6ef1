/// Terminal front end: the scroll-driven starfield rendered as ASCII
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{debug, info};
use std::io::{self, stdout, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use starfolio_core::{
    copy_to_clipboard, on_frame, on_scroll, AppState, CopyMessages, Notifier, StarfolioConfig,
};

pub mod assets;
pub mod clipboard;
pub mod renderer;
pub mod scroll;

pub use clipboard::{StatusLine, SystemClipboard};
pub use renderer::AsciiRenderer;
pub use scroll::ScrollTracker;

/// Main application struct for terminal rendering
pub struct TerminalApp {
    state: AppState,
    renderer: AsciiRenderer,
    scroll: ScrollTracker,
    clipboard: SystemClipboard,
    status: StatusLine,
    messages: CopyMessages,
    copy_text: Option<String>,
    textures: Option<Receiver<assets::LoadResult>>,
    frame_time: Duration,
    running: bool,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: &StarfolioConfig, mut state: AppState, assets_dir: &Path) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        // Bottom row is the status line
        let rows = height.saturating_sub(1).max(1);
        state
            .camera
            .set_aspect(width as f32 * config.terminal.cell_aspect, rows as f32);

        let textures = spawn_texture_loads(&state, assets_dir);

        Ok(Self {
            renderer: AsciiRenderer::new(width as usize, rows as usize),
            state,
            scroll: ScrollTracker::new(config.terminal.scroll_step, config.terminal.max_scroll),
            clipboard: SystemClipboard::new(),
            status: StatusLine::default(),
            messages: CopyMessages::from(&config.clipboard),
            copy_text: config.clipboard.text.clone(),
            textures,
            frame_time: Duration::from_secs(1) / config.terminal.fps.max(1),
            running: true,
            last_tick: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        // Page starts at the top
        on_scroll(&mut self.state, self.scroll.offset());
        info!("render loop started, {:?} per frame", self.frame_time);

        while self.running {
            let frame_start = Instant::now();

            // Handle every queued input event before drawing
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.apply_texture_loads();

            // Update and draw into the renderer's buffers
            let elapsed = frame_start.duration_since(self.last_tick);
            self.last_tick = frame_start;
            on_frame(&mut self.state, elapsed, &mut self.renderer);

            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let spent = frame_start.elapsed();
            if spent < self.frame_time {
                std::thread::sleep(self.frame_time - spent);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let moved = match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                    None
                }
                KeyCode::Char('c') => {
                    self.copy();
                    None
                }
                KeyCode::Char('j') | KeyCode::Down => self.scroll.scroll_down(1),
                KeyCode::Char('k') | KeyCode::Up => self.scroll.scroll_up(1),
                KeyCode::PageDown | KeyCode::Char(' ') => self.scroll.scroll_down(5),
                KeyCode::PageUp => self.scroll.scroll_up(5),
                KeyCode::Home | KeyCode::Char('g') => self.scroll.jump_to_top(),
                _ => None,
            },
            Event::Mouse(MouseEvent { kind, .. }) => match kind {
                MouseEventKind::ScrollDown => self.scroll.scroll_down(1),
                MouseEventKind::ScrollUp => self.scroll.scroll_up(1),
                _ => None,
            },
            _ => None,
        };

        if let Some(offset) = moved {
            on_scroll(&mut self.state, offset);
        }
    }

    fn copy(&mut self) {
        let Some(text) = self.copy_text.as_deref() else {
            self.status.notify("Nothing to copy: set clipboard.text in the config");
            return;
        };
        // arboard writes synchronously, so the future completes immediately
        if let Err(e) = pollster::block_on(copy_to_clipboard(
            text,
            &mut self.clipboard,
            &mut self.status,
            &self.messages,
        )) {
            debug!("copy failed, reported on the status line: {e}");
        }
    }

    fn apply_texture_loads(&mut self) {
        let Some(rx) = &self.textures else {
            return;
        };
        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(loaded) => {
                    if let Some((id, image)) = assets::apply_loaded(&mut self.state.scene, loaded) {
                        self.renderer.insert_texture(id, image);
                    }
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.textures = None;
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Status line
        let notice = self.status.message().unwrap_or("");
        queue!(
            stdout,
            cursor::MoveTo(0, self.renderer.height() as u16),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Starfolio | FPS: {:.1} | scroll: {:.0} | Wheel/J/K=Scroll C=Copy Q=Quit | {}",
                self.fps,
                self.scroll.offset(),
                notice
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

fn spawn_texture_loads(state: &AppState, assets_dir: &Path) -> Option<Receiver<assets::LoadResult>> {
    if state.scene.textures.pending().next().is_none() {
        return None;
    }
    Some(assets::spawn_loader(&state.scene, assets_dir))
}
