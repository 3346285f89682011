//! Procedurally generated demo scene.
//!
//! Meshes are packed into containers on disk and go through the same loader
//! path as any scene file.

use std::f32::consts::{PI, TAU};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use glam::Vec3;
use orrery_asset::{ContainerWriter, Vertex};
use orrery_engine::render::{ModelRequest, ModelVariant, Transform};

/// Indexed triangle mesh, counter-clockwise front faces.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Packs the mesh (and an optional encoded image) into a container.
    pub fn to_container(&self, image: Option<&[u8]>) -> Vec<u8> {
        let writer = ContainerWriter::new()
            .indices(&self.indices)
            .vertices(&self.vertices);
        match image {
            Some(encoded) => writer.image(encoded).finish(),
            None => writer.finish(),
        }
    }
}

/// UV sphere around the origin. Pole rows emit no degenerate triangles.
pub fn sphere(radius: f32, rings: u32, segments: u32) -> Mesh {
    let mut mesh = Mesh::default();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let phi = u * TAU;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
            let tangent = Vec3::new(-phi.sin(), phi.cos(), 0.0);
            let bitangent = normal.cross(tangent);
            mesh.vertices.push(
                Vertex::new((normal * radius).to_array(), normal.to_array(), [u, v])
                    .with_tangents(tangent.to_array(), bitangent.to_array()),
            );
        }
    }

    let row = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * row + segment;
            let b = a + row;
            let c = b + 1;
            let d = a + 1;
            if ring + 1 != rings {
                mesh.indices.extend([a, b, c]);
            }
            if ring != 0 {
                mesh.indices.extend([a, c, d]);
            }
        }
    }
    mesh
}

/// Axis-aligned cube of half-extent `half`, four vertices per face.
pub fn cube(half: f32) -> Mesh {
    // (normal, u, v) with u × v = normal.
    const FACES: [[Vec3; 3]; 6] = [
        [Vec3::X, Vec3::Y, Vec3::Z],
        [Vec3::NEG_X, Vec3::NEG_Y, Vec3::Z],
        [Vec3::Y, Vec3::Z, Vec3::X],
        [Vec3::NEG_Y, Vec3::NEG_Z, Vec3::X],
        [Vec3::Z, Vec3::X, Vec3::Y],
        [Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y],
    ];

    let mut mesh = Mesh::default();
    for [normal, u, v] in FACES {
        quad(&mut mesh, normal * half, u * half, v * half, normal);
    }
    mesh
}

/// Square in the XY plane facing +Z.
pub fn plane(half: f32) -> Mesh {
    let mut mesh = Mesh::default();
    quad(&mut mesh, Vec3::ZERO, Vec3::X * half, Vec3::Y * half, Vec3::Z);
    mesh
}

fn quad(mesh: &mut Mesh, center: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
    let base = mesh.vertices.len() as u32;
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (su, sv) in corners {
        let position = center + u * su + v * sv;
        let uv = [(su + 1.0) * 0.5, (1.0 - sv) * 0.5];
        mesh.vertices.push(
            Vertex::new(position.to_array(), normal.to_array(), uv)
                .with_tangents(u.normalize().to_array(), v.normalize().to_array()),
        );
    }
    mesh.indices
        .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Two-tone checkerboard, PNG-encoded.
pub fn checker_png(size: u32, cells: u32) -> anyhow::Result<Vec<u8>> {
    let cell = (size / cells).max(1);
    let image = image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            image::Rgba([220, 220, 210, 255])
        } else {
            image::Rgba([70, 90, 110, 255])
        }
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("encode checker texture")?;
    Ok(bytes)
}

/// Default location of the generated demo files.
pub fn default_dir() -> PathBuf {
    std::env::temp_dir().join(format!("orrery-demo-{}", std::process::id()))
}

/// Writes the demo containers into `dir` and returns their load requests:
/// a reflective sphere, a cube showing its own environment map, a ground
/// plane and the sky.
pub fn write_scene(dir: &Path) -> anyhow::Result<Vec<ModelRequest>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create demo dir '{}'", dir.display()))?;

    let checker = checker_png(256, 8)?;
    let models = [
        (
            "sphere.bin",
            sphere(1.0, 32, 64).to_container(Some(&checker)),
            ModelVariant::EnvMapped,
            Transform::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        ),
        (
            "cube.bin",
            cube(0.75).to_container(None),
            ModelVariant::EnvDebug,
            Transform {
                translation: Vec3::new(3.0, -1.5, 0.75),
                rotation_deg: Vec3::new(0.0, 0.0, 30.0),
                ..Transform::default()
            },
        ),
        (
            "ground.bin",
            plane(1.0).to_container(Some(&checker)),
            ModelVariant::General,
            Transform {
                scale: Vec3::new(12.0, 12.0, 1.0),
                ..Transform::default()
            },
        ),
        (
            "sky.bin",
            cube(1.0).to_container(None),
            ModelVariant::Skybox,
            Transform {
                scale: Vec3::splat(500.0),
                ..Transform::default()
            },
        ),
    ];

    let mut requests = Vec::with_capacity(models.len());
    for (name, bytes, variant, transform) in models {
        let path = dir.join(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("write demo model '{}'", path.display()))?;
        requests.push(ModelRequest {
            path,
            variant,
            transform,
        });
    }

    log::info!("demo scene written to {}", dir.display());
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(mesh: &Mesh) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let position = |i: u32| Vec3::from_array(mesh.vertices[i as usize].position);
        mesh.indices
            .chunks_exact(3)
            .map(move |t| [position(t[0]), position(t[1]), position(t[2])])
    }

    /// Every triangle is counter-clockwise seen from outside a convex mesh
    /// centred at `center`.
    fn assert_outward(mesh: &Mesh, center: Vec3) {
        for [a, b, c] in triangles(mesh) {
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                face_normal.dot(centroid - center) > 0.0,
                "inward triangle {a} {b} {c}"
            );
        }
    }

    #[test]
    fn sphere_counts_and_bounds() {
        let mesh = sphere(2.0, 8, 16);
        assert_eq!(mesh.vertices.len(), 9 * 17);
        // Two triangles per quad, minus one per quad in each pole row.
        assert_eq!(mesh.indices.len(), (8 * 16 * 2 - 2 * 16) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.length() - 2.0).abs() < 1e-4);
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_faces_outward() {
        assert_outward(&sphere(1.0, 12, 24), Vec3::ZERO);
    }

    #[test]
    fn cube_faces_outward() {
        let mesh = cube(0.5);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_outward(&mesh, Vec3::ZERO);
        for v in &mesh.vertices {
            assert!(Vec3::from_array(v.position).abs().max_element() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(1.0);
        assert_eq!(mesh.indices, [0, 1, 2, 0, 2, 3]);
        assert_outward(&mesh, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn containers_parse_back() {
        let mesh = cube(1.0);
        let model = orrery_asset::parse(&mesh.to_container(None)).unwrap();
        assert_eq!(model.index_count(), 36);
        assert_eq!(model.vertex_count(), 24);
        assert!(model.diffuse.is_none());

        let png = checker_png(16, 4).unwrap();
        let model = orrery_asset::parse(&plane(1.0).to_container(Some(&png))).unwrap();
        let diffuse = model.diffuse.unwrap();
        assert_eq!(diffuse.dimensions(), (16, 16));
        assert_eq!(diffuse.get_pixel(0, 0).0, [220, 220, 210, 255]);
        assert_eq!(diffuse.get_pixel(4, 0).0, [70, 90, 110, 255]);
    }

    #[test]
    fn scene_files_are_written() {
        let dir = std::env::temp_dir().join(format!("orrery-demo-test-{}", std::process::id()));
        let requests = write_scene(&dir).unwrap();

        let variants: Vec<_> = requests.iter().map(|r| r.variant).collect();
        assert_eq!(
            variants,
            [
                ModelVariant::EnvMapped,
                ModelVariant::EnvDebug,
                ModelVariant::General,
                ModelVariant::Skybox,
            ]
        );
        for request in &requests {
            let bytes = std::fs::read(&request.path).unwrap();
            assert!(orrery_asset::parse(&bytes).is_ok(), "{}", request.path.display());
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
