//! Surface interpolation on committed meshes.

use super::buffer::{BufferType, VertexBuffer};
use super::index::FaceId;
use super::subdiv_mesh::{SubdivMesh, NUM_USER_BUFFERS};
use crate::error::{Result, SubdivError};
use crate::eval::{interpolation_slots, ControlPoints, Derivatives, PatchCache, PatchRef, PatchSample, GROUP_SIZE};

/// Interpolated values for one or more parametric locations.
///
/// Every array is component-major: component `c` of lane `i` is stored at
/// `c * count + i`. Derivative arrays are empty unless requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpolation {
    /// Number of floats per value (the buffer stride).
    pub num_floats: usize,
    /// Number of lanes.
    pub count: usize,
    /// Positions.
    pub p: Vec<f32>,
    /// dP/du.
    pub dpdu: Vec<f32>,
    /// dP/dv.
    pub dpdv: Vec<f32>,
    /// d²P/du².
    pub ddpdudu: Vec<f32>,
    /// d²P/dv².
    pub ddpdvdv: Vec<f32>,
    /// d²P/dudv.
    pub ddpdudv: Vec<f32>,
}

impl Interpolation {
    fn new(num_floats: usize, count: usize, derivatives: Derivatives) -> Self {
        let len = num_floats * count;
        let first = if derivatives.first() { len } else { 0 };
        let second = if derivatives.second() { len } else { 0 };
        Self {
            num_floats,
            count,
            p: vec![0.0; len],
            dpdu: vec![0.0; first],
            dpdv: vec![0.0; first],
            ddpdudu: vec![0.0; second],
            ddpdvdv: vec![0.0; second],
            ddpdudv: vec![0.0; second],
        }
    }

    /// Position of `lane`, gathered into a vector.
    pub fn position(&self, lane: usize) -> Vec<f32> {
        (0..self.num_floats).map(|c| self.p[c * self.count + lane]).collect()
    }

    fn write(&mut self, lane: usize, group: usize, width: usize, sample: &PatchSample) {
        let n = self.count;
        for k in 0..width {
            let at = (group * GROUP_SIZE + k) * n + lane;
            self.p[at] = sample.p[k];
            if !self.dpdu.is_empty() {
                self.dpdu[at] = sample.dpdu[k];
                self.dpdv[at] = sample.dpdv[k];
            }
            if !self.ddpdudu.is_empty() {
                self.ddpdudu[at] = sample.ddpdudu[k];
                self.ddpdvdv[at] = sample.ddpdvdv[k];
                self.ddpdudv[at] = sample.ddpdudv[k];
            }
        }
    }
}

impl SubdivMesh {
    /// Resolve a buffer selector to its data and cache.
    fn interpolation_source(&self, buffer: BufferType) -> Result<(&VertexBuffer, &PatchCache)> {
        match buffer {
            BufferType::Vertex(t) => {
                let data = self.vertex_buffer(t).ok_or(SubdivError::UnknownBuffer(buffer))?;
                Ok((data, &self.vertex_caches[t]))
            }
            BufferType::User(slot) if slot < NUM_USER_BUFFERS => {
                let data = self.user_buffer(slot).ok_or(SubdivError::UnsetBuffer(buffer))?;
                Ok((data, &self.user_caches[slot]))
            }
            _ => Err(SubdivError::UnknownBuffer(buffer)),
        }
    }

    fn check_interpolatable(&self) -> Result<()> {
        if !self.scene().is_interpolatable() {
            return Err(SubdivError::InterpolationDisabled);
        }
        if !self.is_committed() {
            return Err(SubdivError::NotCommitted);
        }
        Ok(())
    }

    fn check_face(&self, face: usize) -> Result<()> {
        let num_faces = self.topology().num_faces();
        if face >= num_faces {
            return Err(SubdivError::FaceOutOfRange { face, num_faces });
        }
        Ok(())
    }

    /// Evaluate every group of `face` for the given lanes.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_face(
        &self,
        face: usize,
        lanes: &[usize],
        u: &[f32],
        v: &[f32],
        data: &VertexBuffer,
        cache: &PatchCache,
        derivatives: Derivatives,
        out: &mut Interpolation,
    ) -> Result<()> {
        let stride = data.stride();
        let patch = PatchRef::new(self.topology(), FaceId::new(face));
        let generation = self.scene().generation();

        for group in 0..interpolation_slots(stride) {
            let points = ControlPoints::new(data.as_slice(), stride, group);
            // caches are sized on commit; a stride change needs a new commit
            let mut entry = cache.lock(face, group).ok_or(SubdivError::NotCommitted)?;
            for &lane in lanes {
                let sample = self.evaluator.evaluate(
                    patch,
                    &points,
                    &mut entry,
                    generation,
                    u[lane],
                    v[lane],
                    derivatives,
                )?;
                out.write(lane, group, points.width(), &sample);
            }
        }
        Ok(())
    }

    /// Evaluate `buffer` on `face` at `(u, v)`.
    ///
    /// Works on vertex buffers of any time step and on user buffers. Fails
    /// when the scene was created without interpolation, when the mesh was
    /// never committed, or when the face or buffer does not exist.
    pub fn interpolate(
        &self,
        face: usize,
        u: f32,
        v: f32,
        buffer: BufferType,
        derivatives: Derivatives,
    ) -> Result<Interpolation> {
        self.check_interpolatable()?;
        let (data, cache) = self.interpolation_source(buffer)?;
        self.check_face(face)?;

        let mut out = Interpolation::new(data.stride(), 1, derivatives);
        self.evaluate_face(face, &[0], &[u], &[v], data, cache, derivatives, &mut out)?;
        Ok(out)
    }

    /// Evaluate many `(face, u, v)` lanes at once.
    ///
    /// Lanes whose `valid` entry is `false` are skipped and left at zero.
    /// Lanes on the same face share one cache lookup per group. Output order
    /// matches input order.
    pub fn interpolate_n(
        &self,
        valid: Option<&[bool]>,
        faces: &[u32],
        u: &[f32],
        v: &[f32],
        buffer: BufferType,
        derivatives: Derivatives,
    ) -> Result<Interpolation> {
        self.check_interpolatable()?;
        let (data, cache) = self.interpolation_source(buffer)?;

        let n = faces.len();
        if u.len() != n || v.len() != n {
            return Err(SubdivError::invalid_param(
                "u/v length",
                format!("{}/{}", u.len(), v.len()),
                "must match the number of faces",
            ));
        }
        if let Some(mask) = valid {
            if mask.len() != n {
                return Err(SubdivError::invalid_param(
                    "valid length",
                    mask.len(),
                    "must match the number of faces",
                ));
            }
        }

        let mut lanes: Vec<usize> = (0..n)
            .filter(|&i| valid.map_or(true, |mask| mask[i]))
            .collect();
        for &lane in &lanes {
            self.check_face(faces[lane] as usize)?;
        }
        lanes.sort_by_key(|&lane| faces[lane]);

        let mut out = Interpolation::new(data.stride(), n, derivatives);
        for group in lanes.chunk_by(|&a, &b| faces[a] == faces[b]) {
            let face = faces[group[0]] as usize;
            self.evaluate_face(face, group, u, v, data, cache, derivatives, &mut out)?;
        }
        Ok(out)
    }
}
