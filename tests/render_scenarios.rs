//! End-to-end rendering scenarios

use std::path::{Path, PathBuf};

use deferred_raster::rasterizer::{
    barycentric, point_in_triangle, Color, Image, RasterSettings, Rasterizer, ShadingPath, Triangle, Vec2, Vec3,
};
use deferred_raster::scene::{
    load_scene, AntiAliasMode, Camera, Geometry, Light, MeshInstance, MeshTransform, Scene,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Camera at (0, 0, 5) looking at the origin, far plane at 21
fn facing_camera_scene(size: usize) -> Scene {
    Scene {
        width: size,
        height: size,
        camera: Camera {
            far_clip: 21.0,
            ..Camera::default()
        },
        ambient: Color::new(0.1, 0.1, 0.1),
        specular_exponent: 16.0,
        ..Scene::default()
    }
}

fn render(scene: &Scene, settings: RasterSettings) -> (Image, Rasterizer<'_>) {
    let mut r = Rasterizer::with_settings(scene, settings).unwrap();
    let mut image = Image::new(scene.width, scene.height, Color::BLACK);
    r.render(&mut image);
    (image, r)
}

#[test]
fn lit_triangle_matches_hand_computed_blinn_phong() {
    let tri = Triangle::from_positions(
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    );
    let mut scene = facing_camera_scene(64);
    scene.lights = vec![Light {
        pos: Vec3::new(0.5, 0.5, 2.0),
        color: Color::WHITE,
        intensity: 3.0,
    }];
    scene.meshes = vec![MeshInstance {
        geometry: Geometry::Triangles(vec![tri]),
        transform: MeshTransform::default(),
    }];

    let (image, r) = render(&scene, RasterSettings::default());

    let centroid = Vec3::new(0.0, -1.0 / 3.0, 0.0);
    let s = r.transforms().project(centroid);
    let (px, py) = (s.x as usize, s.y as usize);
    let g = r.gbuffer().get(px, py).copied().flatten().expect("centroid pixel is covered");

    // one pixel spans 5/64 world units at this distance
    assert!((g.pos - centroid).len() < 0.1);
    assert!((g.normal - Vec3::new(0.0, 0.0, 1.0)).len() < 1e-5);

    // diffuse takes N.L on the raw light vector; only H is unit length
    let (lx, ly, lz) = (0.5 - g.pos.x, 0.5 - g.pos.y, 2.0 - g.pos.z);
    let (vx, vy, vz) = (-g.pos.x, -g.pos.y, 5.0 - g.pos.z);
    let r2 = lx * lx + ly * ly + lz * lz;
    let (hx, hy, hz) = (lx + vx, ly + vy, lz + vz);
    let n_dot_h = hz / (hx * hx + hy * hy + hz * hz).sqrt();
    let attenuation = 3.0 / r2;
    let expected = 0.1 + attenuation * lz + attenuation * n_dot_h.powf(16.0);

    let got = image.get(px, py).unwrap();
    assert!((got.r - expected).abs() < 1e-4, "got {}, expected {}", got.r, expected);
    assert_eq!(got.r, got.g);
    assert_eq!(got.g, got.b);
}

#[test]
fn overlapping_triangles_resolve_independently_of_order() {
    let near = Triangle::from_positions(
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    );
    let far = Triangle::from_positions(
        Vec3::new(-1.5, -0.5, -1.0),
        Vec3::new(1.5, -0.5, -1.0),
        Vec3::new(0.0, 1.5, -1.0),
    );

    let scene_with = |tris: Vec<Triangle>| {
        let mut scene = facing_camera_scene(64);
        scene.lights = vec![Light {
            pos: Vec3::new(0.0, 2.0, 3.0),
            color: Color::new(1.0, 0.8, 0.6),
            intensity: 6.0,
        }];
        scene.meshes = vec![MeshInstance {
            geometry: Geometry::Triangles(tris),
            transform: MeshTransform::default(),
        }];
        scene
    };

    let near_first = scene_with(vec![near, far]);
    let far_first = scene_with(vec![far, near]);
    let (a, ra) = render(&near_first, RasterSettings::default());
    let (b, rb) = render(&far_first, RasterSettings::default());

    assert_eq!(a, b);
    assert_eq!(ra.gbuffer(), rb.gbuffer());

    let center = ra.gbuffer().get(32, 32).copied().flatten().unwrap();
    assert!((center.pos.z - 1.0).abs() < 1e-4);
}

fn write_checker_texture(name: &str) -> PathBuf {
    let mut img = Image::new(8, 8, Color::BLACK);
    for y in 0..8 {
        for x in 0..8 {
            if (x + y) % 2 == 1 {
                img.set(x, y, Color::WHITE);
            }
        }
    }
    let path = std::env::temp_dir().join(format!("{}_{}.png", name, std::process::id()));
    img.save(&path).unwrap();
    path
}

fn textured_quad_scene(distance: f32, texture: &Path) -> Scene {
    let mut scene = facing_camera_scene(64);
    scene.texture = texture.to_string_lossy().into_owned();
    scene.meshes = vec![MeshInstance {
        geometry: Geometry::Quad,
        transform: MeshTransform {
            translation: Vec3::new(0.0, 0.0, 5.0 - distance),
            scale: Vec3::new(3.0, 3.0, 1.0),
            ..MeshTransform::default()
        },
    }];
    scene
}

#[test]
fn receding_quad_samples_coarser_mip_levels() {
    let texture = write_checker_texture("deferred_raster_checker");

    // close: full-resolution checker, texels are pure black or white
    let near_scene = textured_quad_scene(2.0, &texture);
    let (_, near) = render(&near_scene, RasterSettings::default());
    let near_texels: Vec<Color> = near.gbuffer().cells().iter().flatten().map(|g| g.texel).collect();
    assert!(!near_texels.is_empty());
    assert!(near_texels.iter().all(|t| t.r == 0.0 || t.r == 1.0));
    assert!(near_texels.iter().any(|t| t.r == 0.0));
    assert!(near_texels.iter().any(|t| t.r == 1.0));

    // far: a box-filtered level, the checker has averaged out
    let far_scene = textured_quad_scene(15.0, &texture);
    let (_, far) = render(&far_scene, RasterSettings::default());
    let far_texels: Vec<Color> = far.gbuffer().cells().iter().flatten().map(|g| g.texel).collect();
    assert!(!far_texels.is_empty());
    assert!(far_texels.iter().all(|t| (t.r - 0.5).abs() < 1e-6));

    let chain = near.mip_chain().unwrap();
    assert_eq!(chain.len(), 4);
    let mut previous = 0;
    for d in 1..=21 {
        let level = chain.level_for_depth(near.transforms().normalized_distance(-(d as f32)));
        assert!(level >= previous, "level dropped at distance {}", d);
        previous = level;
    }
    assert_eq!(previous, chain.len() - 1);

    let _ = std::fs::remove_file(texture);
}

#[test]
fn random_points_agree_with_barycentric_weights() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut inside = 0;

    for _ in 0..500 {
        let mut corner = || Vec3::new(rng.gen_range(0.0..64.0), rng.gen_range(0.0..64.0), 0.0);
        let tri = Triangle::from_positions(corner(), corner(), corner());
        if tri.signed_area2().abs() < 50.0 {
            continue;
        }

        let [a, b, c] = tri.screen_points();
        let centroid = (a + b + c) * (1.0 / 3.0);
        assert!(point_in_triangle(centroid, &tri));

        let p = Vec2::new(rng.gen_range(0.0..64.0), rng.gen_range(0.0..64.0));
        let bc = barycentric(p, &tri).unwrap();
        assert!((bc.x + bc.y + bc.z - 1.0).abs() < 1e-4);

        let q = a * bc.x + b * bc.y + c * bc.z;
        assert!((q.x - p.x).abs() < 1e-2 && (q.y - p.y).abs() < 1e-2);

        if point_in_triangle(p, &tri) {
            inside += 1;
            assert!(bc.x > -1e-4 && bc.y > -1e-4 && bc.z > -1e-4);
        }
    }

    assert!(inside > 10);
}

fn rotated_quad_scene(anti_alias: AntiAliasMode) -> Scene {
    let mut scene = facing_camera_scene(48);
    scene.anti_alias = anti_alias;
    scene.lights = vec![Light {
        pos: Vec3::new(1.0, 1.0, 3.0),
        color: Color::WHITE,
        intensity: 8.0,
    }];
    scene.meshes = vec![MeshInstance {
        geometry: Geometry::Quad,
        transform: MeshTransform {
            scale: Vec3::new(1.5, 1.5, 1.0),
            rotation_axis: Vec3::new(0.0, 0.0, 1.0),
            rotation_degrees: 20.0,
            ..MeshTransform::default()
        },
    }];
    scene
}

#[test]
fn msaa_scales_edge_pixels_by_coverage() {
    let plain = rotated_quad_scene(AntiAliasMode::None);
    let msaa = rotated_quad_scene(AntiAliasMode::Msaa { samples: 4 });
    let (img_plain, _) = render(&plain, RasterSettings::default());
    let (img_msaa, r) = render(&msaa, RasterSettings::default());

    let mut partial = 0;
    for y in 0..48 {
        for x in 0..48 {
            let mask = *r.coverage_mask().get(x, y).unwrap();
            let plain_px = *img_plain.get(x, y).unwrap();
            let msaa_px = *img_msaa.get(x, y).unwrap();
            if mask == 1.0 {
                assert_eq!(msaa_px, plain_px);
            } else if mask > 0.0 {
                partial += 1;
                assert!(msaa_px.distance(mask * plain_px) < 1e-6);
            }
        }
    }
    assert!(partial > 0);
}

#[test]
fn bundled_scene_renders_the_same_on_both_paths() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/scenes/lit_quad.ron");
    let scene = load_scene(&path).unwrap();

    let (deferred, rd) = render(&scene, RasterSettings::default());
    let forward_settings = RasterSettings {
        shading: ShadingPath::Forward,
        ..RasterSettings::default()
    };
    let (forward, _) = render(&scene, forward_settings);

    assert_eq!(deferred, forward);
    assert!(rd.gbuffer().cells().iter().any(|c| c.is_some()));
}
