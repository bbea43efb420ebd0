use crate::errors::RepCoachError;

use super::Position2D;

/// Vectors shorter than this are treated as zero length
const MIN_VECTOR_LENGTH: f32 = 1e-6;

/// Calculates the angle at vertex `b` formed by the rays towards `a` and `c`.
///
/// Returns degrees in the `[0, 180]` range. Points that collapse onto the vertex do not define an
/// angle and produce [`RepCoachError::InvalidGeometry`].
pub fn angle_at(a: Position2D, b: Position2D, c: Position2D) -> Result<f32, RepCoachError> {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let ba_len = ba.0.hypot(ba.1);
    let bc_len = bc.0.hypot(bc.1);
    if !ba_len.is_finite() || !bc_len.is_finite() {
        return Err(RepCoachError::InvalidGeometry {
            reason: "non-finite landmark coordinate".to_string(),
        });
    }
    if ba_len < MIN_VECTOR_LENGTH || bc_len < MIN_VECTOR_LENGTH {
        return Err(RepCoachError::InvalidGeometry {
            reason: "landmark coincides with the joint vertex".to_string(),
        });
    }

    // floating point overshoot on collinear points would push acos out of its domain
    let cosine = ((ba.0 * bc.0 + ba.1 * bc.1) / (ba_len * bc_len)).clamp(-1.0, 1.0);
    Ok(cosine.acos().to_degrees())
}
