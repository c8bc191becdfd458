/// Most on-intervals a single dashed path can produce; the rest of the
/// path is left undrawn.
pub const MAX_DASH_INTERVALS: usize = 1 << 14;

/// Boundary points of the on-intervals of a dash pattern over `[0, length]`.
///
/// The pattern starts at `-phase` (wrapped into one cycle) and alternates
/// on/off starting with "on" at index 0. An odd-length pattern is repeated
/// once so the cycle is even. Returned values come in `(start, end)` pairs;
/// an on-interval cut by `length` is closed with `length`.
///
/// At most [`MAX_DASH_INTERVALS`] pairs are produced.
///
/// With a 100-unit line and `[20, 10]` this yields
/// `[0, 20, 30, 50, 60, 80, 90, 100]`.
pub fn dash_boundaries(length: f32, dashes: &[f32], phase: f32) -> Vec<f32> {
    if !(length > 0.0) {
        return Vec::new();
    }

    let pattern: Vec<f32> = if dashes.len() % 2 == 1 {
        dashes.iter().chain(dashes).copied().collect()
    } else {
        dashes.to_vec()
    };
    let cycle: f32 = pattern.iter().sum();
    if pattern.is_empty() || !(cycle > 0.0) || !cycle.is_finite() {
        return vec![0.0, length];
    }

    let phase = if phase.is_finite() { phase.rem_euclid(cycle) } else { 0.0 };
    let mut pos = -phase;
    let mut out = Vec::new();

    for (i, &d) in pattern.iter().cycle().enumerate() {
        if out.len() >= 2 * MAX_DASH_INTERVALS || i >= 4 * MAX_DASH_INTERVALS {
            break;
        }
        let end = pos + d;
        if i % 2 == 0 && d > 0.0 && end > 0.0 {
            out.push(pos.max(0.0));
            if end < length {
                out.push(end);
            }
        }
        if end >= length {
            break;
        }
        pos = end;
    }

    if out.len() % 2 == 1 {
        out.push(length);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_pattern_on_huge_length_is_capped() {
        let b = dash_boundaries(1e20, &[1.0, 1.0], 0.0);
        assert_eq!(b.len() % 2, 0);
        assert!(b.len() <= 2 * MAX_DASH_INTERVALS);

        let b = dash_boundaries(1e6, &[1.0, 1.0], 0.0);
        assert_eq!(b.len(), 2 * MAX_DASH_INTERVALS);
        assert_eq!(&b[..4], &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn even_pattern_over_line() {
        assert_eq!(
            dash_boundaries(100.0, &[20.0, 10.0], 0.0),
            vec![0.0, 20.0, 30.0, 50.0, 60.0, 80.0, 90.0, 100.0]
        );
    }

    #[test]
    fn phase_shifts_pattern() {
        // Starts 5 units into the first dash.
        assert_eq!(dash_boundaries(40.0, &[20.0, 10.0], 5.0), vec![0.0, 15.0, 25.0, 40.0]);
        // Phase larger than a cycle wraps.
        assert_eq!(dash_boundaries(40.0, &[20.0, 10.0], 35.0), dash_boundaries(40.0, &[20.0, 10.0], 5.0));
    }

    #[test]
    fn phase_into_gap_starts_off() {
        assert_eq!(dash_boundaries(30.0, &[20.0, 10.0], 25.0), vec![5.0, 25.0]);
    }

    #[test]
    fn odd_pattern_is_doubled() {
        // [10] behaves like [10, 10].
        assert_eq!(dash_boundaries(35.0, &[10.0], 0.0), vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn boundaries_always_pair_up() {
        for len in [1.0, 7.5, 33.0, 100.0, 101.0] {
            for phase in [0.0, 3.0, 17.0, -4.0] {
                let b = dash_boundaries(len, &[6.0, 4.0, 2.0], phase);
                assert_eq!(b.len() % 2, 0, "len {len} phase {phase}");
                assert!(b.windows(2).all(|w| w[0] <= w[1]));
                assert!(b.iter().all(|x| (0.0..=len).contains(x)));
            }
        }
    }

    #[test]
    fn degenerate_inputs() {
        assert!(dash_boundaries(0.0, &[1.0, 1.0], 0.0).is_empty());
        assert_eq!(dash_boundaries(10.0, &[0.0, 0.0], 0.0), vec![0.0, 10.0]);
    }
}
