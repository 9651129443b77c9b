use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::GetGlDisplay,
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use raw_window_handle::HasRawWindowHandle;
use std::{
    ffi::CString,
    num::NonZeroU32,
    process,
    time::Instant,
};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowBuilder},
};

use shaderkit::{
    config::core::{AppConfig, CONFIG_FILE},
    render::{
        context::GlContext,
        frame::RenderContext,
        mesh::{Mesh, MeshData},
        shaders::{load_program, ShaderProgram},
        source::FileSource,
    },
    utils::{
        error::AppError,
        logging::{init_logging, DiagnosticLog},
    },
};

// GL objects are declared first so they drop while the context is still alive
struct App {
    program: ShaderProgram<GlContext>,
    mesh: Mesh,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
    frame: RenderContext,
    config: AppConfig,
    diagnostics: Option<DiagnosticLog>,
}

impl App {
    fn new(
        config: AppConfig,
        diagnostics: &mut Option<DiagnosticLog>,
    ) -> Result<(Self, EventLoop<()>), AppError> {
        let event_loop = EventLoop::new().map_err(|e| AppError::Window(e.to_string()))?;

        let window_config = &config.window;
        let mut window_builder = WindowBuilder::new()
            .with_title(&window_config.title)
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        if window_config.fullscreen {
            window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    // glutin-winit never calls the picker with an empty iterator
                    .expect("display offered no GL configs")
            })
            .map_err(|e| AppError::Window(e.to_string()))?;

        let window = window.ok_or_else(|| AppError::Window("no window was created".to_string()))?;
        let raw_window_handle = window.raw_window_handle();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                window_config.gl_major,
                window_config.gl_minor,
            ))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();
        let not_current = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .map_err(|e| AppError::Context(e.to_string()))?
        };

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .map_err(|e| AppError::Context(e.to_string()))?
        };

        let gl_context = not_current
            .make_current(&gl_surface)
            .map_err(|e| AppError::Context(e.to_string()))?;

        let interval = if config.rendering.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
            warn!("Could not set swap interval: {}", e);
        }

        // Load OpenGL functions
        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()) as *const _,
            Err(_) => std::ptr::null(),
        });
        if !gl::CreateShader::is_loaded() {
            return Err(AppError::Context("OpenGL function loading failed".to_string()));
        }

        let ctx = GlContext::new();
        let info = ctx.info();
        for line in info.lines() {
            info!("{}", line);
        }
        if let Some(log) = diagnostics.as_mut() {
            log.write_lines(info.lines())?;
        }

        let size = window.inner_size();
        unsafe {
            if config.rendering.depth_test {
                gl::Enable(gl::DEPTH_TEST);
                gl::DepthFunc(gl::LESS);
            }
            let [r, g, b, a] = config.rendering.clear_color;
            gl::ClearColor(r, g, b, a);
            gl::Viewport(0, 0, size.width as i32, size.height as i32);
        }

        let provider = FileSource::new(&config.shaders.root);
        let program = load_program(&ctx, &provider, &config.shaders.vertex, &config.shaders.fragment)?;
        let location = program.attribute_location("vertexCoord").unwrap_or(0);
        let mesh = Mesh::new(&MeshData::quad(), location);

        // validation depends on a bound vertex array, so it runs after the mesh exists
        program.bind();
        mesh.bind();
        if let Err(e) = program.validate() {
            warn!("{}", e);
        }

        let report = program.report();
        info!("{}", report);
        if let Some(log) = diagnostics.as_mut() {
            log.write_lines(report.to_string().lines())?;
        }

        let frame = RenderContext::new(size.width, size.height, window_config.fullscreen, Instant::now());

        Ok((
            Self {
                program,
                mesh,
                gl_surface,
                gl_context,
                window,
                frame,
                config,
                diagnostics: diagnostics.take(),
            },
            event_loop,
        ))
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if !self.frame.resize(size.width, size.height) {
            return;
        }
        if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.gl_surface.resize(&self.gl_context, w, h);
        }
        unsafe {
            gl::Viewport(0, 0, size.width as i32, size.height as i32);
        }
    }

    fn toggle_fullscreen(&mut self) {
        if self.frame.toggle_fullscreen() {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            self.window.set_fullscreen(None);
        }
        info!("Fullscreen: {}", self.frame.fullscreen);
    }

    fn render(&mut self) -> Result<(), AppError> {
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
        self.program.bind();
        self.mesh.draw();

        self.gl_surface
            .swap_buffers(&self.gl_context)
            .map_err(|e| AppError::Context(e.to_string()))?;

        if self.frame.end_frame(Instant::now()).is_some() {
            self.window.set_title(&self.frame.title(&self.config.window.title));
        }
        Ok(())
    }

    /// Returns true when the application should exit.
    fn handle_window_event(&mut self, event: &WindowEvent) -> Result<bool, AppError> {
        match event {
            WindowEvent::CloseRequested => return Ok(true),
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => return Ok(true),
                KeyCode::F11 => self.toggle_fullscreen(),
                _ => {}
            },
            WindowEvent::RedrawRequested => self.render()?,
            _ => {}
        }
        Ok(false)
    }
}

/// Logs `err` everywhere it should be seen and terminates the process.
fn abort(err: &AppError, diagnostics: Option<&mut DiagnosticLog>) -> ! {
    let message = format!("ABORT::{}: {}", err.kind(), err);
    error!("{}", message);
    if let Some(log) = diagnostics {
        if let Err(e) = log.error(&message) {
            error!("Could not write {}: {}", log.path().display(), e);
        }
    }
    process::exit(1);
}

fn main() {
    let config = match AppConfig::load_or_default(CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR::{:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("ERROR::could not initialize logging: {}", e);
    }
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut diagnostics = match DiagnosticLog::restart(&config.logging.file) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!("Could not open {} for writing: {}", config.logging.file, e);
            None
        }
    };

    let (mut app, event_loop) = match App::new(config, &mut diagnostics) {
        Ok(pair) => pair,
        Err(e) => abort(&e, diagnostics.as_mut()),
    };

    let result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match app.handle_window_event(&event) {
                Ok(true) => {
                    info!("Closing window after {} frames", app.frame.frame_count);
                    elwt.exit();
                }
                Ok(false) => {}
                Err(e) => abort(&e, app.diagnostics.as_mut()),
            },
            Event::AboutToWait => app.window.request_redraw(),
            _ => (),
        }
    });

    if let Err(e) = result {
        abort(&AppError::Window(e.to_string()), None);
    }
}
