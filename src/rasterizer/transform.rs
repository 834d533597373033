//! Model, view, projection and screen-space transforms
//!
//! A vertex goes through `screen_space * projection * view * model`. The
//! projection leaves view-space z in the clip `w`, which the passes keep per
//! vertex for reciprocal-depth interpolation.

use super::math::{Mat4, Vec3, Vec4};
use super::types::Triangle;
use crate::scene::{Camera, MeshTransform};

/// World-to-camera transform. The camera looks down its local -z axis.
///
/// `camera.up` must not be parallel to the gaze direction.
pub fn build_view(camera: &Camera) -> Mat4 {
    let gaze = (camera.look_at - camera.pos).normalize();
    let side = gaze.cross(camera.up).normalize();
    // equals normalize(up) whenever up is already perpendicular to the gaze
    let up = side.cross(gaze).normalize();

    let translate_to_origin = Mat4::translation(-camera.pos);
    let world_to_camera = Mat4::from_cols(
        [side.x, up.x, -gaze.x, 0.0],
        [side.y, up.y, -gaze.y, 0.0],
        [side.z, up.z, -gaze.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    );
    world_to_camera * translate_to_origin
}

/// Perspective frustum squashed into the canonical [-1, 1]^3 box.
///
/// The near plane lands on z = 1 and the far plane on z = -1, so larger
/// depth is nearer. `near_clip` and `far_clip` must differ.
pub fn build_projection(camera: &Camera) -> Mat4 {
    // camera-space plane positions, negative in front of the camera
    let n = -camera.near_clip;
    let f = -camera.far_clip;

    let perspective = Mat4::from_cols(
        [n, 0.0, 0.0, 0.0],
        [0.0, n, 0.0, 0.0],
        [0.0, 0.0, n + f, 1.0],
        [0.0, 0.0, -n * f, 0.0],
    );
    let translate_to_center = Mat4::translation(Vec3::new(0.0, 0.0, -(n + f) / 2.0));
    let scale_to_box = Mat4::scale(Vec3::new(
        2.0 / camera.width,
        2.0 / camera.height,
        2.0 / (n - f),
    ));

    scale_to_box * translate_to_center * perspective
}

/// Canonical [-1, 1]^2 to pixel coordinates [0, width] x [0, height].
///
/// y is flipped so that +y in the canonical box is row 0 of the image.
/// Depth passes through unscaled.
pub fn build_screen_space(width: usize, height: usize) -> Mat4 {
    let w = width as f32;
    let h = height as f32;
    Mat4::from_cols(
        [w / 2.0, 0.0, 0.0, 0.0],
        [0.0, -h / 2.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [w / 2.0, h / 2.0, 0.0, 1.0],
    )
}

/// Rotation part of a mesh transform
pub fn build_rotation(transform: &MeshTransform) -> Mat4 {
    Mat4::rotation_axis_angle(transform.rotation_axis, transform.rotation_degrees)
}

/// translation * rotation * scale
pub fn build_model(transform: &MeshTransform, rotation: Mat4) -> Mat4 {
    Mat4::translation(transform.translation) * rotation * Mat4::scale(transform.scale)
}

/// All matrices for one render
#[derive(Debug, Clone)]
pub struct Transforms {
    /// One per added mesh instance; the index is the model id
    pub models: Vec<Mat4>,
    pub view: Mat4,
    pub projection: Mat4,
    pub screen_space: Mat4,
    near: f32,
    far: f32,
}

impl Transforms {
    pub fn new(camera: &Camera, width: usize, height: usize) -> Self {
        Self {
            models: Vec::new(),
            view: build_view(camera),
            projection: build_projection(camera),
            screen_space: build_screen_space(width, height),
            near: camera.near_clip,
            far: camera.far_clip,
        }
    }

    /// Append a model matrix built from `transform`; returns its id
    pub fn add_model(&mut self, transform: &MeshTransform) -> usize {
        self.add_model_with_rotation(transform, build_rotation(transform))
    }

    /// Append a model matrix with an externally supplied rotation
    pub fn add_model_with_rotation(&mut self, transform: &MeshTransform, rotation: Mat4) -> usize {
        self.models.push(build_model(transform, rotation));
        self.models.len() - 1
    }

    /// World space to screen space, for points already transformed by a model matrix
    pub fn world_to_screen(&self) -> Mat4 {
        self.screen_space * self.projection * self.view
    }

    /// Project a world-space point to (pixel x, pixel y, canonical depth, view-space z)
    pub fn project(&self, world: Vec3) -> Vec4 {
        project_with(&self.world_to_screen(), world)
    }

    /// Transform a model-space triangle into its world-space and screen-space
    /// forms. Returns `None` when any vertex sits at or behind the camera.
    pub fn transform_triangle(&self, model_id: usize, tri: &Triangle) -> Option<(Triangle, Triangle)> {
        let model = self.models.get(model_id)?;
        let to_screen = self.world_to_screen();

        let mut world = *tri;
        let mut screen = *tri;
        for i in 0..3 {
            let p = model.transform_point(tri.pos[i].xyz());
            world.pos[i] = p;
            world.normal[i] = model.transform_normal(tri.normal[i]);

            let s = project_with(&to_screen, p.xyz());
            if s.w.is_nan() || s.w >= 0.0 {
                return None;
            }
            screen.pos[i] = s;
            screen.normal[i] = world.normal[i];
        }
        Some((world, screen))
    }

    /// Map a view-space z to a linear distance in [-1, 1]: -1 at the near
    /// plane, 1 at the far plane
    pub fn normalized_distance(&self, view_z: f32) -> f32 {
        let distance = -view_z;
        2.0 * (distance - self.near) / (self.far - self.near) - 1.0
    }
}

fn project_with(m: &Mat4, world: Vec3) -> Vec4 {
    let clip = m.transform_point(world);
    Vec4::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w, clip.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            pos: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            up: Vec3::UP,
            near_clip: 1.0,
            far_clip: 11.0,
            width: 2.0,
            height: 2.0,
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_view_moves_camera_to_origin() {
        let view = build_view(&camera());
        let eye = view.transform_point(Vec3::new(0.0, 0.0, 5.0));
        assert!(eye.xyz().len() < 1e-5);

        // the look-at target lies straight ahead on -z
        let target = view.transform_point(Vec3::ZERO);
        assert!(close(target.x, 0.0) && close(target.y, 0.0) && close(target.z, -5.0));
    }

    #[test]
    fn test_view_basis_is_orthonormal_for_tilted_up() {
        let mut cam = camera();
        cam.up = Vec3::new(0.0, 1.0, 1.0);
        let view = build_view(&cam);
        let rows = [view.row(0).xyz(), view.row(1).xyz(), view.row(2).xyz()];
        for (i, a) in rows.iter().enumerate() {
            assert!(close(a.len(), 1.0));
            for b in &rows[i + 1..] {
                assert!(close(a.dot(*b), 0.0));
            }
        }
    }

    #[test]
    fn test_projection_maps_near_and_far_planes() {
        let cam = camera();
        let proj = build_projection(&cam);

        let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!(close(near.z / near.w, 1.0));
        assert!(close(near.w, -1.0));

        let far = proj * Vec4::new(0.0, 0.0, -11.0, 1.0);
        assert!(close(far.z / far.w, -1.0));
        assert!(close(far.w, -11.0));

        // the near-plane window edge maps to the canonical box edge
        let edge = proj * Vec4::new(1.0, 1.0, -1.0, 1.0);
        assert!(close(edge.x / edge.w, 1.0) && close(edge.y / edge.w, 1.0));
    }

    #[test]
    fn test_screen_space_corners() {
        let ss = build_screen_space(200, 100);
        let lo = ss.transform_point(Vec3::new(-1.0, -1.0, 0.25));
        let hi = ss.transform_point(Vec3::new(1.0, 1.0, 0.25));
        assert!(close(lo.x, 0.0) && close(lo.y, 100.0) && close(lo.z, 0.25));
        assert!(close(hi.x, 200.0) && close(hi.y, 0.0) && close(hi.z, 0.25));
    }

    #[test]
    fn test_add_model_appends_translation_rotation_scale() {
        let mut transforms = Transforms::new(&camera(), 64, 64);
        let first = transforms.add_model(&MeshTransform::default());
        let t = MeshTransform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
            rotation_axis: Vec3::new(0.0, 0.0, 1.0),
            rotation_degrees: 90.0,
        };
        let second = transforms.add_model(&t);
        assert_eq!((first, second), (0, 1));

        // scale (2, 0) -> rotate (0, 2) -> translate (1, 2)
        let p = transforms.models[second].transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(p.x, 1.0) && close(p.y, 2.0) && close(p.z, 0.0));
    }

    #[test]
    fn test_projected_center_hits_image_center() {
        let transforms = Transforms::new(&camera(), 64, 48);
        let s = transforms.project(Vec3::ZERO);
        assert!(close(s.x, 32.0) && close(s.y, 24.0));
        assert!(close(s.w, -5.0));
    }

    #[test]
    fn test_camera_up_is_the_top_image_row() {
        let ss = build_screen_space(64, 48);
        let top = ss.transform_point(Vec3::new(0.0, 1.0, 0.0));
        let bottom = ss.transform_point(Vec3::new(0.0, -1.0, 0.0));
        assert!(close(top.y, 0.0));
        assert!(close(bottom.y, 48.0));

        // the view window spans +-5 at the look-at distance
        let transforms = Transforms::new(&camera(), 64, 48);
        let above = transforms.project(Vec3::new(0.0, 5.0, 0.0));
        let below = transforms.project(Vec3::new(0.0, -5.0, 0.0));
        let left = transforms.project(Vec3::new(-5.0, 0.0, 0.0));
        assert!(close(above.y, 0.0));
        assert!(close(below.y, 48.0));
        assert!(close(left.x, 0.0));
    }

    #[test]
    fn test_triangle_behind_camera_is_rejected() {
        let mut transforms = Transforms::new(&camera(), 64, 64);
        let id = transforms.add_model(&MeshTransform::default());
        let behind = Triangle::from_positions(
            Vec3::new(0.0, 0.0, 6.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(transforms.transform_triangle(id, &behind).is_none());
        assert!(transforms.transform_triangle(id + 1, &behind).is_none());
    }

    #[test]
    fn test_normalized_distance_spans_clip_range() {
        let transforms = Transforms::new(&camera(), 8, 8);
        assert!(close(transforms.normalized_distance(-1.0), -1.0));
        assert!(close(transforms.normalized_distance(-6.0), 0.0));
        assert!(close(transforms.normalized_distance(-11.0), 1.0));
    }
}
