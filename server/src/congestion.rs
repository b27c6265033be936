use crate::error::FetchFailure;

/// Speed reduction against free flow, as a percentage in `0..=100`.
///
/// A zero, negative or non-finite free-flow speed cannot be divided by and is
/// reported as a failed point rather than a value.
pub fn congestion(current_speed: f64, free_flow_speed: f64) -> Result<u8, FetchFailure> {
    let usable = current_speed.is_finite()
        && free_flow_speed.is_finite()
        && current_speed >= 0.0
        && free_flow_speed > 0.0;
    if !usable {
        return Err(FetchFailure::InvalidSpeed {
            current: current_speed,
            free_flow: free_flow_speed,
        });
    }

    let level = ((1.0 - current_speed / free_flow_speed) * 100.0).round();
    Ok(level.clamp(0.0, 100.0) as u8)
}
