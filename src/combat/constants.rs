//! Combatant constants - default stat block and hard limits

// Stat block defaults
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
pub const DEFAULT_TIMER_DURATION: f32 = 12.0;
pub const DEFAULT_MAX_RESOURCE: f32 = 100.0;
pub const DEFAULT_MAX_FORM_POINTS: f32 = 50.0;
pub const DEFAULT_ATTACK_POWER: f32 = 10.0;

// Countdown speed
pub const BASE_TICK_RATE: f32 = 1.0;
pub const MIN_TICK_RATE: f32 = 0.25;

// Overexertion penalty
pub const BASE_GAIN_RATE: f32 = 1.0;
pub const OVEREXERTED_GAIN_RATE: f32 = 0.5;
pub const OVEREXERTED_HEALTH_CAP: f32 = 0.25;

// Passive accrual (resource per second)
pub const PASSIVE_RESOURCE_PER_SECOND: f32 = 5.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate_floor_below_base() {
        assert!(MIN_TICK_RATE > 0.0 && MIN_TICK_RATE < BASE_TICK_RATE);
    }

    #[test]
    fn test_overexertion_is_a_penalty() {
        assert!(OVEREXERTED_GAIN_RATE < BASE_GAIN_RATE);
        assert!(OVEREXERTED_HEALTH_CAP > 0.0 && OVEREXERTED_HEALTH_CAP < 1.0);
    }
}
