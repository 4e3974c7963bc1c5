use std::time::Instant;

use {
    tortuga_config::{ConfigSource, keys},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    parse::{parse_amount, parse_unit},
    types::{ResolvedSchedule, ScheduleSpec},
};

/// Resolve the effective schedule of `task`.
///
/// For each field the `<task>.<field>` override wins when it parses. Otherwise
/// the declared value is read as a literal, and failing that as the name of a
/// configuration key. An override that does not parse is logged and ignored.
pub fn resolve_schedule(
    task: &str,
    spec: &ScheduleSpec,
    config: &dyn ConfigSource,
) -> Result<ResolvedSchedule> {
    let initial_delay = resolve_field(task, "delay", &spec.initial_delay, config, parse_amount)?;
    let period = resolve_field(task, "period", &spec.period, config, parse_amount)?;
    let unit = resolve_field(task, "unit", &spec.unit, config, parse_unit)?;

    if period == 0 {
        return Err(Error::ZeroPeriod {
            task: task.to_string(),
        });
    }

    let resolved = ResolvedSchedule {
        initial_delay,
        period,
        unit,
    };
    let now = Instant::now();
    let Some(first) = now.checked_add(resolved.initial_delay_duration()) else {
        return Err(Error::OutOfRange {
            task: task.to_string(),
            field: "delay",
        });
    };
    if first.checked_add(resolved.period_duration()).is_none() {
        return Err(Error::OutOfRange {
            task: task.to_string(),
            field: "period",
        });
    }
    debug!(task, schedule = %resolved, "resolved schedule");
    Ok(resolved)
}

fn resolve_field<T>(
    task: &str,
    field: &'static str,
    declared: &str,
    config: &dyn ConfigSource,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    let override_key = keys::task_field(task, field);
    if let Some(raw) = config.get(&override_key) {
        match parse(&raw) {
            Some(value) => return Ok(value),
            None => warn!(
                task,
                key = %override_key,
                value = %raw,
                "ignoring invalid schedule override"
            ),
        }
    }

    if let Some(value) = parse(declared) {
        return Ok(value);
    }

    config
        .get(declared.trim())
        .as_deref()
        .and_then(&parse)
        .ok_or_else(|| Error::unresolved(task, field, declared))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        rstest::rstest,
        tortuga_config::{Settings, TimeUnit},
    };

    const TASK: &str = "app::tasks::check_other_stuff";

    fn keyed_spec() -> ScheduleSpec {
        ScheduleSpec::new(
            "scheduler.otherStuff.delay",
            "scheduler.otherStuff.period",
            "scheduler.otherStuff.unit",
        )
    }

    #[test]
    fn literal_schedule() {
        let resolved = resolve_schedule(
            TASK,
            &ScheduleSpec::new("5", "30", "SECONDS"),
            &Settings::new(),
        )
        .unwrap();
        assert_eq!(resolved, ResolvedSchedule {
            initial_delay: 5,
            period: 30,
            unit: TimeUnit::Seconds,
        });
    }

    #[test]
    fn config_key_schedule() {
        let config = Settings::from_pairs([
            ("scheduler.otherStuff.delay", "10"),
            ("scheduler.otherStuff.period", "60"),
            ("scheduler.otherStuff.unit", "MINUTES"),
        ]);
        let resolved = resolve_schedule(TASK, &keyed_spec(), &config).unwrap();
        assert_eq!(resolved.initial_delay, 10);
        assert_eq!(resolved.period, 60);
        assert_eq!(resolved.unit, TimeUnit::Minutes);
    }

    #[test]
    fn missing_key_is_an_error() {
        let config = Settings::from_pairs([
            ("scheduler.otherStuff.delay", "10"),
            ("scheduler.otherStuff.unit", "MINUTES"),
        ]);
        let err = resolve_schedule(TASK, &keyed_spec(), &config).unwrap_err();
        assert!(matches!(err, Error::ScheduleResolution { field: "period", .. }));
    }

    #[test]
    fn key_holding_garbage_is_an_error() {
        let config = Settings::from_pairs([
            ("scheduler.otherStuff.delay", "soon"),
            ("scheduler.otherStuff.period", "60"),
            ("scheduler.otherStuff.unit", "MINUTES"),
        ]);
        let err = resolve_schedule(TASK, &keyed_spec(), &config).unwrap_err();
        assert!(matches!(err, Error::ScheduleResolution { field: "delay", .. }));
    }

    #[rstest]
    #[case("delay", "1", 1, 30, TimeUnit::Seconds)]
    #[case("period", "90", 5, 90, TimeUnit::Seconds)]
    #[case("unit", "milliseconds", 5, 30, TimeUnit::Milliseconds)]
    fn override_wins(
        #[case] field: &str,
        #[case] value: &str,
        #[case] delay: u64,
        #[case] period: u64,
        #[case] unit: TimeUnit,
    ) {
        let config = Settings::from_pairs([(keys::task_field(TASK, field), value.to_string())]);
        let resolved =
            resolve_schedule(TASK, &ScheduleSpec::new("5", "30", "SECONDS"), &config).unwrap();
        assert_eq!(resolved, ResolvedSchedule {
            initial_delay: delay,
            period,
            unit,
        });
    }

    #[test]
    fn invalid_override_falls_back() {
        let config = Settings::from_pairs([(keys::task_field(TASK, "period"), "often")]);
        let resolved =
            resolve_schedule(TASK, &ScheduleSpec::new("5", "30", "SECONDS"), &config).unwrap();
        assert_eq!(resolved.period, 30);
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = resolve_schedule(TASK, &ScheduleSpec::new("0", "0", "SECONDS"), &Settings::new())
            .unwrap_err();
        assert!(matches!(err, Error::ZeroPeriod { .. }));
    }

    #[rstest]
    #[case("18446744073709551615", "1", "delay")]
    #[case("0", "18446744073709551615", "period")]
    fn huge_values_are_rejected(#[case] delay: &str, #[case] period: &str, #[case] expected: &str) {
        let err = resolve_schedule(TASK, &ScheduleSpec::new(delay, period, "DAYS"), &Settings::new())
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { field, .. } if field == expected));
    }
}
