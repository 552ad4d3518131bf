//! Geometry reconciliation performed while edges are being merged.

use tracing::debug;

use crate::Tolerance;
use crate::error::MeshError;
use crate::topology::store::{EdgeLineId, EdgeUseId, Face, FaceId, PlaneId, TopoStore};

/// Choose the edge line that should carry the merged edge.
///
/// When both uses already share a line (or only one has any) there is
/// nothing to decide. Otherwise the line whose direction is most nearly
/// colinear with `eu1`'s endpoint-to-endpoint direction wins, so a short stub
/// split off a longer edge does not drag an unrelated line along with it.
/// Ties keep `eu1`'s line.
pub fn pick_best_edge_geometry(
    store: &TopoStore,
    eu1: EdgeUseId,
    eu2: EdgeUseId,
) -> Result<Option<EdgeLineId>, MeshError> {
    let g1 = store.edge_use(eu1)?.geom;
    let g2 = store.edge_use(eu2)?.geom;
    let (l1, l2) = match (g1, g2) {
        _ if g1 == g2 => return Ok(g1),
        (Some(l1), Some(l2)) => (l1, l2),
        (Some(_), None) => return Ok(g1),
        (None, _) => return Ok(g2),
    };
    let Some(dir) = store.direction(eu1)? else {
        return Ok(g1);
    };
    let d1 = dir.dot(&store.edge_line(l1)?.direction).abs();
    let d2 = dir.dot(&store.edge_line(l2)?.direction).abs();
    Ok(if d2 > d1 { g2 } else { g1 })
}

/// Faces moved onto another plane by [`share_face_geometry`], with their
/// records from before the move.
pub(crate) struct SharedPlane {
    /// The plane nothing references any more. Still in the store.
    pub orphan: Option<PlaneId>,
    pub previous: Vec<(FaceId, Face)>,
}

/// Repoint every face on `merge`'s plane at `keep`'s when the two describe
/// the same plane within `tol`, flipping faces whose normals are opposed.
/// `None`, with the store untouched, when the planes are not coincident.
pub(crate) fn share_face_geometry(
    store: &mut TopoStore,
    keep: FaceId,
    merge: FaceId,
    tol: &Tolerance,
) -> Result<Option<SharedPlane>, MeshError> {
    let keep_geom = store.face(keep)?.geom;
    let merge_geom = store.face(merge)?.geom;
    if keep_geom == merge_geom {
        return Ok(Some(SharedPlane {
            orphan: None,
            previous: Vec::new(),
        }));
    }
    let keep_plane = *store.plane(keep_geom)?;
    let merge_plane = *store.plane(merge_geom)?;
    let Some(reversed) = keep_plane.coincidence(&merge_plane, tol) else {
        return Ok(None);
    };

    let mut previous = Vec::new();
    for (id, face) in store.faces.iter_mut() {
        if face.geom == merge_geom {
            previous.push((id, face.clone()));
            face.geom = keep_geom;
            face.flip ^= reversed;
        }
    }
    debug!(?keep, ?merge, moved = previous.len(), reversed, "fused face geometry");
    Ok(Some(SharedPlane {
        orphan: Some(merge_geom),
        previous,
    }))
}

/// Make `merge` share `keep`'s plane when the two describe the same plane
/// within `tol`.
///
/// Every face on `merge`'s plane is moved over, flipping it when the normals
/// are opposed, and the orphaned plane is removed. Returns `false`, leaving
/// the store untouched, when the planes are not coincident.
pub fn fuse_face_geometry(
    store: &mut TopoStore,
    keep: FaceId,
    merge: FaceId,
    tol: &Tolerance,
) -> Result<bool, MeshError> {
    let Some(shared) = share_face_geometry(store, keep, merge, tol)? else {
        return Ok(false);
    };
    if let Some(plane) = shared.orphan {
        store.planes.remove(plane);
    }
    Ok(true)
}
