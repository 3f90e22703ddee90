use std::sync::Arc;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::WgpuDevice;
use crate::logging::{LoggingConfig, init_logging};
use crate::renderer::{FrameStatus, PlaneRenderer, SceneConfig, StopHandle};
use crate::surface::{ResizeEvents, SurfaceSize};

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Ripple".to_string(),
            width: 800,
            height: 600,
            scene: SceneConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// Open a window and animate the plane until it is closed or Escape is pressed.
///
/// # Example
/// ```no_run
/// ripple::run(ripple::AppConfig::new().title("Ripple").size(1280, 720))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    init_logging(config.logging.clone());

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = RippleApp::Pending { config };
    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;

    match app {
        RippleApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

enum RippleApp {
    Pending {
        config: AppConfig,
    },
    Running {
        window: Arc<Window>,
        device: WgpuDevice,
        renderer: PlaneRenderer,
        resize: ResizeEvents,
        stop: StopHandle,
    },
    Exiting,
    Failed(anyhow::Error),
}

impl RippleApp {
    fn start(config: AppConfig, event_loop: &ActiveEventLoop) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        let mut device = WgpuDevice::new(window.clone())?;
        let resize = ResizeEvents::new();
        let mut renderer = PlaneRenderer::new(config.scene);
        renderer.subscribe(&resize);
        renderer.initialize(&mut device, SurfaceSize::from(window.inner_size()))?;
        renderer.start()?;
        let stop = renderer.stop_handle();

        window.request_redraw();
        Ok(RippleApp::Running {
            window,
            device,
            renderer,
            resize,
            stop,
        })
    }
}

impl ApplicationHandler for RippleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self, RippleApp::Pending { .. }) {
            return;
        }
        let RippleApp::Pending { config } = std::mem::replace(self, RippleApp::Exiting) else {
            return;
        };
        *self = match RippleApp::start(config, event_loop) {
            Ok(app) => app,
            Err(e) => {
                log::error!("startup failed: {e:#}");
                event_loop.exit();
                RippleApp::Failed(e)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let RippleApp::Running {
            window,
            device,
            renderer,
            resize,
            stop,
        } = self
        else {
            return;
        };

        let finished = match event {
            WindowEvent::CloseRequested => true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                stop.stop();
                window.request_redraw();
                false
            }
            WindowEvent::Resized(size) => {
                device.resize(size.width, size.height);
                resize.emit(size.into());
                window.request_redraw();
                false
            }
            WindowEvent::RedrawRequested => match renderer.frame(device) {
                FrameStatus::Stopped => true,
                FrameStatus::Rendered | FrameStatus::Skipped => {
                    window.request_redraw();
                    false
                }
            },
            _ => false,
        };

        if finished {
            renderer.dispose(device);
            log::info!("shutting down");
            *self = RippleApp::Exiting;
            event_loop.exit();
        }
    }
}
