//! Built-in test meshes

use crate::rasterizer::{Triangle, Vec2, Vec3};

const CORNER_UVS: [Vec2; 4] = [
    Vec2 { x: 0.0, y: 0.0 },
    Vec2 { x: 1.0, y: 0.0 },
    Vec2 { x: 1.0, y: 1.0 },
    Vec2 { x: 0.0, y: 1.0 },
];

/// Split a quad (counter-clockwise corners) into two triangles sharing the 0-2 diagonal
fn quad_triangles(corners: [Vec3; 4], normal: Vec3) -> [Triangle; 2] {
    let uv = CORNER_UVS;
    [
        Triangle::new([corners[0], corners[1], corners[2]], [normal; 3], [uv[0], uv[1], uv[2]]),
        Triangle::new([corners[0], corners[2], corners[3]], [normal; 3], [uv[0], uv[2], uv[3]]),
    ]
}

/// 2x2 square in the xy plane facing +z
pub fn create_quad() -> Vec<Triangle> {
    quad_triangles(
        [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        Vec3::new(0.0, 0.0, 1.0),
    )
    .to_vec()
}

/// 2x2x2 cube centred on the origin with per-face normals
pub fn create_cube() -> Vec<Triangle> {
    let faces: [([(f32, f32, f32); 4], (f32, f32, f32)); 6] = [
        // Front
        ([(-1.0, -1.0, 1.0), (1.0, -1.0, 1.0), (1.0, 1.0, 1.0), (-1.0, 1.0, 1.0)], (0.0, 0.0, 1.0)),
        // Back
        ([(1.0, -1.0, -1.0), (-1.0, -1.0, -1.0), (-1.0, 1.0, -1.0), (1.0, 1.0, -1.0)], (0.0, 0.0, -1.0)),
        // Top
        ([(-1.0, 1.0, 1.0), (1.0, 1.0, 1.0), (1.0, 1.0, -1.0), (-1.0, 1.0, -1.0)], (0.0, 1.0, 0.0)),
        // Bottom
        ([(-1.0, -1.0, -1.0), (1.0, -1.0, -1.0), (1.0, -1.0, 1.0), (-1.0, -1.0, 1.0)], (0.0, -1.0, 0.0)),
        // Right
        ([(1.0, -1.0, 1.0), (1.0, -1.0, -1.0), (1.0, 1.0, -1.0), (1.0, 1.0, 1.0)], (1.0, 0.0, 0.0)),
        // Left
        ([(-1.0, -1.0, -1.0), (-1.0, -1.0, 1.0), (-1.0, 1.0, 1.0), (-1.0, 1.0, -1.0)], (-1.0, 0.0, 0.0)),
    ];

    let v = |(x, y, z): (f32, f32, f32)| Vec3::new(x, y, z);
    faces
        .iter()
        .flat_map(|(corners, normal)| quad_triangles(corners.map(v), v(*normal)))
        .collect()
}
