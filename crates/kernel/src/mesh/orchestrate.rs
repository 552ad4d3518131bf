//! Drives the radial join over faces and shells.
//!
//! Self-meshing always runs before cross-meshing, so a cross pass only ever
//! sees radial structure that is already consistent within each face.

use tracing::{debug, instrument};

use super::Mesher;
use super::trace::TraceSink;
use crate::error::MeshError;
use crate::topology::store::{FaceUseId, ShellId, TopoStore};

impl<S: TraceSink> Mesher<S> {
    /// Join every edge of `fu1` with every coincident edge of `fu2` that is
    /// not already the same edge. `fu1 == fu2` meshes a face against itself,
    /// catching loops of one face that run along the same edge.
    #[instrument(skip(self, store))]
    pub fn mesh_two_faces(
        &mut self,
        store: &mut TopoStore,
        fu1: FaceUseId,
        fu2: FaceUseId,
    ) -> Result<usize, MeshError> {
        let limit = self.config.max_iterations;
        let eus1 = store.face_use_edge_uses(fu1, limit)?;
        let eus2 = store.face_use_edge_uses(fu2, limit)?;

        let mut count = 0;
        for &eu1 in &eus1 {
            for &eu2 in &eus2 {
                if store.edge_use(eu1)?.edge == store.edge_use(eu2)?.edge {
                    continue;
                }
                if !store.edge_uses_adjacent(eu1, eu2)? {
                    continue;
                }
                if self.radial_join(store, eu1, eu2)?.merged() {
                    count += 1;
                }
            }
        }
        debug!(count, "mesh_two_faces merged edges");
        Ok(count)
    }

    /// Self-mesh both faces, then mesh them against each other.
    #[instrument(skip(self, store))]
    pub fn mesh_faces(&mut self, store: &mut TopoStore, fu1: FaceUseId, fu2: FaceUseId) -> Result<usize, MeshError> {
        let mut count = self.mesh_two_faces(store, fu1, fu1)?;
        count += self.mesh_two_faces(store, fu2, fu2)?;
        count += self.mesh_two_faces(store, fu1, fu2)?;
        Ok(count)
    }

    /// Mesh one face against every face of a shell.
    #[instrument(skip(self, store))]
    pub fn mesh_face_shell(&mut self, store: &mut TopoStore, fu1: FaceUseId, shell: ShellId) -> Result<usize, MeshError> {
        let mut count = self.mesh_two_faces(store, fu1, fu1)?;
        for fu2 in store.shell_same_face_uses(shell)? {
            if fu2 == fu1 {
                continue;
            }
            count += self.mesh_two_faces(store, fu2, fu2)?;
            count += self.mesh_two_faces(store, fu1, fu2)?;
        }
        debug!(count, "mesh_face_shell merged edges");
        Ok(count)
    }

    /// Mesh every face of `s1` against every face of `s2`. All of `s2` is
    /// self-meshed up front, so the result does not depend on which shell is
    /// passed first.
    #[instrument(skip(self, store))]
    pub fn mesh_shell_shell(&mut self, store: &mut TopoStore, s1: ShellId, s2: ShellId) -> Result<usize, MeshError> {
        let faces1 = store.shell_same_face_uses(s1)?;
        let faces2 = store.shell_same_face_uses(s2)?;

        let mut count = 0;
        for &fu2 in &faces2 {
            count += self.mesh_two_faces(store, fu2, fu2)?;
        }
        for &fu1 in &faces1 {
            count += self.mesh_two_faces(store, fu1, fu1)?;
            for &fu2 in &faces2 {
                if fu1 == fu2 {
                    continue;
                }
                count += self.mesh_two_faces(store, fu1, fu2)?;
            }
        }
        debug!(count, "mesh_shell_shell merged edges");
        Ok(count)
    }
}
