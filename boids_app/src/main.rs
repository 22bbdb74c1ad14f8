extern crate nannou;
use std::collections::HashMap;

use boids_lib::boid::Boid;
use boids_lib::flock::Flock;
use boids_lib::options::{Parameter, ParameterSet, WorldBounds};
use boids_lib::simulation::{ControlEvent, Simulation};
use nannou::color::{srgba, Srgba};
use nannou::prelude::*;
use nannou_egui::{egui, Egui};

mod cliargs;

const ARROW_LENGTH: f32 = 15.;

const INSTRUCTIONS: [&str; 9] = [
    "Controls:",
    "- Drag sliders to adjust parameters",
    "- Click to add boids",
    "- Space: add random boid",
    "- D: remove last boid",
    "- C: clear all boids",
    "- R: reset parameters",
    "- V: toggle visuals, P: pause",
    "- Tab: show/hide sliders, Esc: quit",
];

fn colour(r: u8, g: u8, b: u8, a: u8) -> Srgba {
    srgba(r as f32 / 255., g as f32 / 255., b as f32 / 255., a as f32 / 255.)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    nannou::app(model).update(update).run();
}

struct ControlsState {
    controls_open: bool,
    pointer_over_controls: bool,
}

struct Model {
    egui: Egui,
    simulation: Simulation,
    // the UI's own copy, handed to the simulation every frame
    params: ParameterSet,
    control_state: ControlsState,
}

fn model(app: &App) -> Model {
    let config = match cliargs::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(2);
        }
    };

    let simulation = config.simulation_config().and_then(|sim_config| match config.seed {
        0 => Simulation::new(sim_config),
        seed => Simulation::with_seed(sim_config, seed),
    });
    let simulation = match simulation {
        Ok(simulation) => simulation,
        Err(err) => {
            log::error!("could not start the simulation: {}", err);
            std::process::exit(2);
        }
    };

    let main_window = app
        .new_window()
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .closed(window_closed)
        .size(config.init_width, config.init_height)
        .title("Boids - flocking simulation")
        .raw_event(raw_window_event)
        .view(view)
        .build()
        .unwrap();

    let window = app.window(main_window).unwrap();

    Model {
        egui: Egui::from_window(&window),
        params: *simulation.parameters(),
        simulation,
        control_state: ControlsState {
            controls_open: true,
            pointer_over_controls: false,
        },
    }
}

fn update(app: &App, model: &mut Model, update: Update) {
    let Model {
        ref mut egui,
        ref mut simulation,
        ref mut params,
        ref mut control_state,
    } = *model;

    // the window may have been resized
    let win = app.window_rect();
    if let Err(err) = simulation.set_world(WorldBounds {
        width: win.w(),
        height: win.h(),
    }) {
        log::warn!("keeping the previous world size: {}", err);
    }

    egui.set_elapsed_time(update.since_start);
    let ctx = egui.begin_frame();
    let mut reset_requested = false;
    egui::Window::new("parameters")
        .default_size(egui::vec2(0.0, 200.0))
        .open(&mut control_state.controls_open)
        .show(&ctx, |ui| {
            for p in Parameter::ALL {
                let range = p.range();
                ui.add(egui::Slider::new(params.value_mut(p), range.min..=range.max).text(p.label()));
            }

            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("reset").clicked() {
                    reset_requested = true;
                }
                ui.label(format!("Boids: {}", simulation.flock().len()));
            });

            ui.label(format!("Frame: {}", simulation.frame()));
        });
    control_state.pointer_over_controls = ctx.wants_pointer_input();
    drop(ctx);

    if reset_requested {
        apply(simulation, ControlEvent::ResetParameters);
        *params = *simulation.parameters();
    } else if simulation.set_parameters(params.clamped()).is_err() {
        *params = *simulation.parameters();
    }

    simulation.advance(update.since_last);
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}

fn apply(simulation: &mut Simulation, event: ControlEvent) {
    if let Err(err) = simulation.apply(event) {
        log::warn!("{:?} rejected: {}", event, err);
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let event = match key {
        Key::Space => ControlEvent::AddAgent(None),
        Key::D => ControlEvent::RemoveAgent,
        Key::C => ControlEvent::Clear,
        Key::R => ControlEvent::ResetParameters,
        Key::V => ControlEvent::ToggleDetail,
        Key::P => ControlEvent::TogglePause,
        Key::Tab => {
            model.control_state.controls_open = !model.control_state.controls_open;
            return;
        }
        Key::Escape => {
            app.quit();
            return;
        }
        _ => return,
    };

    apply(&mut model.simulation, event);

    if event == ControlEvent::ResetParameters {
        model.params = *model.simulation.parameters();
    }
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left || model.control_state.pointer_over_controls {
        return;
    }

    let position = screen_to_world(vec2(app.mouse.x, app.mouse.y), model.simulation.world());
    apply(&mut model.simulation, ControlEvent::AddAgent(Some(position)));
}

fn window_closed(_app: &App, model: &mut Model) {
    log::info!(
        "closing after {} frames with {} boids",
        model.simulation.frame(),
        model.simulation.flock().len()
    );
}

/// World space has its origin in the top left corner with y pointing down,
/// nannou's window space is centred with y pointing up.
fn world_to_screen(p: Vec2, world: &WorldBounds) -> Vec2 {
    vec2(p.x - world.width / 2., world.height / 2. - p.y)
}

fn screen_to_world(p: Vec2, world: &WorldBounds) -> Vec2 {
    vec2(p.x + world.width / 2., world.height / 2. - p.y)
}

pub trait Drawable {
    fn draw(&self, draw: &Draw, simulation: &Simulation);
}

impl Drawable for Flock {
    fn draw(&self, draw: &Draw, simulation: &Simulation) {
        let world = simulation.world();

        if simulation.show_detail() {
            let positions: HashMap<usize, Vec2> = self
                .boids()
                .iter()
                .map(|b| (b.id, world_to_screen(b.position, world)))
                .collect();

            for b in self.boids() {
                let start = positions[&b.id];

                draw.ellipse()
                    .xy(start)
                    .radius(simulation.parameters().perception_radius)
                    .no_fill()
                    .stroke(colour(30, 100, 150, 50))
                    .stroke_weight(1.);

                for end in b.last_neighbours().iter().filter_map(|id| positions.get(id)) {
                    draw.line()
                        .start(start)
                        .end(*end)
                        .color(colour(255, 100, 100, 100))
                        .weight(1.);
                }
            }
        }

        for b in self.boids() {
            b.draw(draw, simulation);
        }
    }
}

impl Drawable for Boid {
    fn draw(&self, draw: &Draw, simulation: &Simulation) {
        let position = world_to_screen(self.position, simulation.world());
        // flip y to get the heading in window space
        let theta = (-self.velocity.y).atan2(self.velocity.x);
        let tip = position + vec2(theta.cos(), theta.sin()) * ARROW_LENGTH;
        let color = colour(100, 200, 255, 255);

        if simulation.show_detail() {
            let side = |offset: f32| {
                tip - vec2((theta + offset).cos(), (theta + offset).sin()) * ARROW_LENGTH / 2.
            };
            draw.polygon()
                .points(vec![tip, side(-PI / 6.), position, side(PI / 6.)])
                .color(color);
        } else {
            draw.ellipse().xy(position).radius(3.).color(color);
        }

        draw.line()
            .start(position)
            .end(tip)
            .color(color)
            .weight(2.);
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let win = app.window_rect();
    let text_color = colour(200, 220, 255, 255);

    draw.background().color(colour(10, 10, 30, 255));

    model.flock().draw(&draw, &model.simulation);

    for (i, line) in INSTRUCTIONS.iter().enumerate() {
        draw.text(line)
            .x_y(win.right() - 170., win.top() - 40. - i as f32 * 20.)
            .w(320.)
            .left_justify()
            .color(text_color);
    }

    let status = format!(
        "Boids: {}{}",
        model.simulation.flock().len(),
        if model.simulation.is_paused() { " (paused)" } else { "" }
    );
    draw.text(&status)
        .x_y(win.left() + 100., win.bottom() + 20.)
        .color(text_color);

    draw.text("Press 'V' to toggle visuals")
        .x_y(0., win.bottom() + 20.)
        .w(300.)
        .color(text_color);

    draw.to_frame(app, &frame).unwrap();
    model.egui.draw_to_frame(&frame).unwrap();
}

impl Model {
    fn flock(&self) -> &Flock {
        self.simulation.flock()
    }
}
