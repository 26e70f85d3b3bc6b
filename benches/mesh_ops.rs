//! Benchmarks for topology construction and evaluation.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use subdiv_mesh::prelude::*;

fn create_grid_mesh(n: u32, options: TopologyOptions) -> SubdivMesh {
    let mut positions = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
    let mut indices = Vec::with_capacity((n * n * 4) as usize);

    for j in 0..=n {
        for i in 0..=n {
            positions.push([i as f32, j as f32, 0.0]);
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v10, v11, v01]);
        }
    }

    let scene = Arc::new(Scene::new(SceneFlags::default().interpolatable()));
    let sizes = MeshSizes::new((n * n) as usize, indices.len(), positions.len());
    let mut mesh = SubdivMesh::new(scene, sizes, options).unwrap();
    mesh.set_faces(vec![4; (n * n) as usize]).unwrap();
    mesh.set_indices(indices).unwrap();
    mesh.set_vertices(0, VertexBuffer::from_points(&positions).unwrap())
        .unwrap();
    mesh.commit().unwrap();
    mesh
}

fn bench_topology_build(c: &mut Criterion) {
    let mut parallel = create_grid_mesh(256, TopologyOptions::default());
    c.bench_function("rebuild_grid_256x256", |b| {
        b.iter(|| {
            parallel.update_buffer(BufferType::Index).unwrap();
            parallel.commit().unwrap()
        });
    });

    let mut sequential = create_grid_mesh(256, TopologyOptions::default().sequential());
    c.bench_function("rebuild_grid_256x256_sequential", |b| {
        b.iter(|| {
            sequential.update_buffer(BufferType::Index).unwrap();
            sequential.commit().unwrap()
        });
    });
}

fn bench_incremental_update(c: &mut Criterion) {
    let mut mesh = create_grid_mesh(256, TopologyOptions::default());
    let num_edges = mesh.half_edges().len();
    mesh.set_levels(vec![4.0; num_edges]).unwrap();
    mesh.commit().unwrap();

    c.bench_function("level_update_grid_256x256", |b| {
        b.iter(|| {
            mesh.update_buffer(BufferType::Level).unwrap();
            mesh.commit().unwrap()
        });
    });

    c.bench_function("crease_update_grid_256x256", |b| {
        b.iter(|| {
            mesh.set_edge_creases(vec![[0, 1], [257, 258]], vec![2.0, 3.0])
                .unwrap();
            mesh.commit().unwrap()
        });
    });
}

fn bench_interpolation(c: &mut Criterion) {
    let mesh = create_grid_mesh(64, TopologyOptions::default());
    let n = 4096;
    let faces: Vec<u32> = (0..n).map(|i| (i * 7 % 4096) as u32).collect();
    let u: Vec<f32> = (0..n).map(|i| (i % 16) as f32 / 16.0).collect();
    let v: Vec<f32> = (0..n).map(|i| (i % 13) as f32 / 13.0).collect();

    c.bench_function("interpolate_n_4096", |b| {
        b.iter(|| {
            mesh.interpolate_n(None, &faces, &u, &v, BufferType::Vertex(0), Derivatives::First)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_topology_build, bench_incremental_update, bench_interpolation);
criterion_main!(benches);
