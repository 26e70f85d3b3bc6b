//! Bilinear reference evaluator.
//!
//! Quads are evaluated as bilinear patches over their four corners, triangles
//! linearly over barycentric `(u, v)`. The result interpolates the control
//! points exactly at the face corners, which makes it a useful stand-in for a
//! full subdivision evaluator in tests and tools.

use nalgebra::Vector4;

use super::{CacheEntry, ControlPoints, Derivatives, PatchEvaluator, PatchRef, PatchSample};
use crate::error::{Result, SubdivError};

/// Bilinear patch evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearEvaluator;

impl BilinearEvaluator {
    /// Create the evaluator.
    pub fn new() -> Self {
        Self
    }

    fn gather(patch: &PatchRef<'_>, points: &ControlPoints<'_>, cache: &mut CacheEntry) -> Result<()> {
        let topology = patch.topology();
        cache.points.clear();
        for he in patch.ring() {
            let vertex = topology.origin(he);
            let p = points.point(vertex).ok_or(SubdivError::InvalidVertexIndex {
                face: patch.face().index(),
                vertex: vertex.index(),
            })?;
            cache.points.push(p);
        }
        Ok(())
    }
}

impl PatchEvaluator for BilinearEvaluator {
    fn evaluate(
        &self,
        patch: PatchRef<'_>,
        points: &ControlPoints<'_>,
        cache: &mut CacheEntry,
        generation: u64,
        u: f32,
        v: f32,
        derivatives: Derivatives,
    ) -> Result<PatchSample> {
        let valence = patch.valence();
        if valence != 3 && valence != 4 {
            return Err(SubdivError::UnsupportedPatch {
                face: patch.face().index(),
                valence,
            });
        }

        if !cache.is_current(generation) {
            if let Err(e) = Self::gather(&patch, points, cache) {
                cache.invalidate();
                return Err(e);
            }
            cache.set_tag(generation);
        }

        let cp = &cache.points;
        Ok(if valence == 4 {
            bilinear(cp[0], cp[1], cp[2], cp[3], u, v, derivatives)
        } else {
            linear(cp[0], cp[1], cp[2], u, v, derivatives)
        })
    }
}

fn bilinear(
    p0: Vector4<f32>,
    p1: Vector4<f32>,
    p2: Vector4<f32>,
    p3: Vector4<f32>,
    u: f32,
    v: f32,
    derivatives: Derivatives,
) -> PatchSample {
    let mut sample = PatchSample {
        p: p0 * ((1.0 - u) * (1.0 - v)) + p1 * (u * (1.0 - v)) + p2 * (u * v) + p3 * ((1.0 - u) * v),
        ..Default::default()
    };
    if derivatives.first() {
        sample.dpdu = (p1 - p0) * (1.0 - v) + (p2 - p3) * v;
        sample.dpdv = (p3 - p0) * (1.0 - u) + (p2 - p1) * u;
    }
    if derivatives.second() {
        // pure second derivatives of a bilinear patch vanish
        sample.ddpdudv = p0 - p1 + p2 - p3;
    }
    sample
}

fn linear(p0: Vector4<f32>, p1: Vector4<f32>, p2: Vector4<f32>, u: f32, v: f32, derivatives: Derivatives) -> PatchSample {
    let mut sample = PatchSample {
        p: p0 * (1.0 - u - v) + p1 * u + p2 * v,
        ..Default::default()
    };
    if derivatives.first() {
        sample.dpdu = p1 - p0;
        sample.dpdv = p2 - p0;
    }
    sample
}
