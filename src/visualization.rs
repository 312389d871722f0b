//! Interactive 3D cube viewer using kiss3d.

use std::f32::consts::FRAC_PI_4;
use std::time::Instant;

use kiss3d::event::{Action, Key, Modifiers, MouseButton, WindowEvent};
use kiss3d::prelude::*;

use rubiks::picking::Ray;
use rubiks::scene::{NodeId, Visual};
use rubiks::{Cube, Face, Session, Theme};

/// Fixed camera; mouse input drives the cube, never the camera.
const CAMERA_EYE: [f32; 3] = [3.2, 2.6, 4.4];
const CAMERA_FOVY: f32 = FRAC_PI_4;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1024.0;

const THEMES: [fn() -> Theme; 2] = [Theme::classic, Theme::pastel];

fn color(color: rubiks::Color) -> Color {
    let [r, g, b] = color.rgb();
    Color::new(r, g, b, 1.0)
}

/// Where a rendered node takes its color from.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Fill {
    Body,
    Sticker { piece: usize, face: Face },
}

impl Fill {
    fn current(self, cube: &Cube) -> Option<rubiks::Color> {
        match self {
            Fill::Body => Some(cube.model().piece_color()),
            Fill::Sticker { piece, face } => cube
                .model()
                .piece(piece)
                .and_then(|piece| piece.sticker(face))
                .map(|sticker| sticker.color),
        }
    }
}

/// A kiss3d node mirroring one visual node of the cube's scene graph.
struct RenderedNode {
    source: NodeId,
    fill: Fill,
    shown: rubiks::Color,
    node: SceneNode3d,
}

/// Adds a kiss3d box for every body and sticker of the cube, sized by its
/// world scale.
fn build_nodes(scene: &mut SceneNode3d, cube: &Cube) -> Vec<RenderedNode> {
    let graph = cube.scene();
    let model = cube.model();
    let mut rendered = Vec::new();

    for piece in model.pieces() {
        let visuals = std::iter::once((piece.body, Fill::Body, model.piece_color())).chain(
            piece.stickers.iter().map(|sticker| {
                let fill = Fill::Sticker {
                    piece: piece.index,
                    face: sticker.face,
                };
                (sticker.node, fill, sticker.color)
            }),
        );

        for (source, fill, shown) in visuals {
            let Ok(world) = graph.world_transform(source) else {
                continue;
            };
            let scale = world.scale.x;
            let (width, depth) = match graph.visual(source) {
                Some(Visual::Body(shape)) => (shape.size, shape.size),
                Some(Visual::Sticker { shape, .. }) => (shape.size, shape.depth),
                None => continue,
            };
            let node = scene
                .add_cube(width * scale, width * scale, depth * scale)
                .set_color(color(shown));
            rendered.push(RenderedNode {
                source,
                fill,
                shown,
                node,
            });
        }
    }

    log::debug!("built {} render nodes", rendered.len());
    rendered
}

/// Copies world transforms from the cube's scene graph onto kiss3d nodes,
/// and recolors nodes whose theme or sticker color changed.
fn sync_nodes(cube: &Cube, rendered: &mut [RenderedNode]) {
    let graph = cube.scene();
    for entry in rendered {
        if let Some(current) = entry.fill.current(cube) {
            if current != entry.shown {
                entry.node.set_color(color(current));
                entry.shown = current;
            }
        }
        let Ok(world) = graph.world_transform(entry.source) else {
            continue;
        };
        let quat = world.rotation;
        entry.node.set_position(Vec3::from_array(world.position.to_array()));
        entry
            .node
            .set_rotation(Quat::from_xyzw(quat.x, quat.y, quat.z, quat.w));
    }
}

/// Inverse view-projection of the fixed camera for a window of `width` by
/// `height` pixels.
fn inverse_view_projection(width: f32, height: f32) -> glam::Mat4 {
    let view = glam::Mat4::look_at_rh(
        glam::Vec3::from_array(CAMERA_EYE),
        glam::Vec3::ZERO,
        glam::Vec3::Y,
    );
    let aspect = if height > 0.0 { width / height } else { 1.0 };
    let projection = glam::Mat4::perspective_rh_gl(CAMERA_FOVY, aspect, CAMERA_NEAR, CAMERA_FAR);
    (projection * view).inverse()
}

/// Converts a cursor position in pixels to normalized device coordinates.
fn to_ndc(x: f64, y: f64, width: f32, height: f32) -> glam::Vec2 {
    glam::Vec2::new(
        2.0 * x as f32 / width.max(1.0) - 1.0,
        1.0 - 2.0 * y as f32 / height.max(1.0),
    )
}

/// Paint colors cycle through the current theme's face colors.
fn palette_color(theme: &Theme, index: usize) -> rubiks::Color {
    theme.faces[index % theme.faces.len()]
}

fn face_for_key(key: Key) -> Option<Face> {
    match key {
        Key::L => Some(Face::L),
        Key::R => Some(Face::R),
        Key::D => Some(Face::D),
        Key::U => Some(Face::U),
        Key::B => Some(Face::B),
        Key::F => Some(Face::F),
        _ => None,
    }
}

fn size_for_key(key: Key) -> Option<usize> {
    match key {
        Key::Key2 => Some(2),
        Key::Key3 => Some(3),
        Key::Key4 => Some(4),
        Key::Key5 => Some(5),
        _ => None,
    }
}

fn title(session: &Session) -> String {
    let n = session.cube().size();
    format!(
        "{n}x{n}x{n} cube - [Arrows] orbit, [FBUDLR] turn, [2-5] size, [T] theme, \
         [Right click] paint, [C] paint color"
    )
}

/// Opens the viewer and runs until the window is closed.
pub fn display(session: Session) {
    pollster::block_on(display_async(session));
}

async fn display_async(mut session: Session) {
    let mut window = Window::new(&title(&session)).await;

    let mut camera = OrbitCamera3d::new(Vec3::from_array(CAMERA_EYE), Vec3::ZERO);
    let mut scene = SceneNode3d::empty();
    scene
        .add_light(Light::point(100.0))
        .set_position(Vec3::new(5.0, 5.0, 5.0));

    let mut rendered = build_nodes(&mut scene, session.cube());
    let mut shown_size = session.cube().size();
    let mut theme_index = 0;
    let mut palette_index = 0;

    let mut cursor = (0.0f64, 0.0f64);
    let mut dragging = false;
    let mut last_frame = Instant::now();

    loop {
        let size = window.size();
        let (width, height) = (size.x as f32, size.y as f32);

        for mut event in window.events().iter() {
            match event.value {
                WindowEvent::MouseButton(MouseButton::Button1, Action::Press, _) => {
                    let point = to_ndc(cursor.0, cursor.1, width, height);
                    let ray = Ray::from_ndc(point, &inverse_view_projection(width, height));
                    dragging = session.on_drag_start(point, Some(&ray));
                    event.inhibited = true;
                }
                WindowEvent::MouseButton(MouseButton::Button2, Action::Press, _) => {
                    let point = to_ndc(cursor.0, cursor.1, width, height);
                    let ray = Ray::from_ndc(point, &inverse_view_projection(width, height));
                    let paint = palette_color(session.cube().theme(), palette_index);
                    if let Some((piece, face)) = session.paint_sticker(&ray, paint) {
                        log::debug!("painted {face} sticker of piece {piece}");
                    }
                    event.inhibited = true;
                }
                WindowEvent::MouseButton(MouseButton::Button1, Action::Release, _) => {
                    if dragging {
                        session.on_drag_end();
                        dragging = false;
                    }
                    event.inhibited = true;
                }
                WindowEvent::CursorPos(x, y, _) => {
                    cursor = (x, y);
                    if dragging {
                        session.on_drag_move(to_ndc(x, y, width, height));
                    }
                    event.inhibited = true;
                }
                WindowEvent::MouseButton(..) | WindowEvent::Scroll(..) => {
                    event.inhibited = true;
                }
                WindowEvent::Key(key, Action::Press, modifiers) => {
                    let direction = if modifiers.contains(Modifiers::Shift) {
                        -1
                    } else {
                        1
                    };
                    match key {
                        Key::Left => {
                            session.rotate_left();
                        }
                        Key::Right => {
                            session.rotate_right();
                        }
                        Key::Up => {
                            session.rotate_up();
                        }
                        Key::T => {
                            theme_index = (theme_index + 1) % THEMES.len();
                            session.set_theme(THEMES[theme_index]());
                        }
                        Key::C => {
                            palette_index = (palette_index + 1) % Face::ALL.len();
                            let next = palette_color(session.cube().theme(), palette_index);
                            log::info!("painting with #{:06x}", next.0);
                        }
                        _ => {
                            if let Some(face) = face_for_key(key) {
                                session.rotate_face(face, direction);
                            } else if let Some(n) = size_for_key(key) {
                                if let Err(err) = session.set_size(n) {
                                    log::error!("cannot resize: {err}");
                                }
                            }
                        }
                    }
                    event.inhibited = true;
                }
                _ => {}
            }
        }

        if session.cube().size() != shown_size {
            for mut entry in rendered.drain(..) {
                entry.node.remove();
            }
            rendered = build_nodes(&mut scene, session.cube());
            shown_size = session.cube().size();
            window.set_title(&title(&session));
        }

        let now = Instant::now();
        session.update(now.duration_since(last_frame).as_secs_f32() * 1000.0);
        last_frame = now;
        sync_nodes(session.cube(), &mut rendered);

        if !window.render_3d(&mut scene, &mut camera).await {
            break;
        }
    }
}
