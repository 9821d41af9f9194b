//! Calendar actions: the weekly timetable and the current time

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDateTime, Weekday};

use crate::actions::{Action, ActionArgs, ActionContext};
use crate::{Error, Result};

/// Source of the current local time
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Clock reading the system's local time
#[must_use]
pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Built-in timetable; `{honorific}` is filled from the persona
const fn default_entry(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => {
            "From 9:00 AM to 9:50 AM you have Algorithm class, from 10:00 AM to 11:50 AM you have DSA class."
        }
        Weekday::Tue => {
            "From 9:00 AM to 9:50 AM you have Database Management class, from 10:00 AM to 11:50 AM you have Computer Networks class, from 2:00 PM to 4:50 PM you have DSA Lab."
        }
        Weekday::Wed => {
            "From 9:00 AM to 9:50 AM you have Operating Systems class, from 10:00 AM to 11:50 AM you have Software Engineering class, from 2:00 PM to 4:50 PM you have CN Lab."
        }
        Weekday::Thu => {
            "From 9:00 AM to 9:50 AM you have Database Management class, from 10:00 AM to 11:50 AM you have Algorithm class, from 2:00 PM to 4:50 PM you have DBMS Lab."
        }
        Weekday::Fri => {
            "From 9:00 AM to 9:50 AM you have Operating Systems class, from 10:00 AM to 11:50 AM you have Computer Networks class."
        }
        Weekday::Sat => {
            "From 9:00 AM to 9:50 AM you have Software Engineering class, from 10:00 AM to 11:50 AM you have Open Elective or Extra class."
        }
        Weekday::Sun => "You are free today, {honorific}. Time to relax or revise!",
    }
}

const fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `get_schedule` action
pub struct ScheduleTool {
    overrides: HashMap<Weekday, String>,
    clock: Clock,
}

impl ScheduleTool {
    #[must_use]
    pub fn new(overrides: HashMap<Weekday, String>, clock: Clock) -> Self {
        Self { overrides, clock }
    }

    /// Resolve a spoken day; blank or "today" means the current day
    fn resolve_day(&self, day: Option<&str>) -> Result<Weekday> {
        match day.map(str::trim).filter(|d| !d.is_empty()) {
            None => Ok((self.clock)().weekday()),
            Some(d) if d.eq_ignore_ascii_case("today") => Ok((self.clock)().weekday()),
            Some(d) if d.eq_ignore_ascii_case("tomorrow") => Ok((self.clock)().weekday().succ()),
            Some(d) => d.parse::<Weekday>().map_err(|_| {
                let days = WEEK
                    .iter()
                    .map(|w| day_name(*w).to_ascii_lowercase())
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::Rejected(format!(
                    "I don't have schedule information for '{d}'. Try one of: {days}."
                ))
            }),
        }
    }
}

#[async_trait]
impl Action for ScheduleTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let day = self.resolve_day(args.str("day"))?;
        let entry = self
            .overrides
            .get(&day)
            .map_or_else(|| default_entry(day).to_string(), Clone::clone)
            .replace("{honorific}", &ctx.persona.honorific);

        tracing::info!(day = day_name(day), "retrieved schedule");
        Ok(format!("Your schedule for {}: {entry}", day_name(day)))
    }
}

/// `get_time_and_date` action
pub struct ClockTool {
    clock: Clock,
}

impl ClockTool {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }
}

/// "Today is Monday, January 05, 2026. The current time is 09:07 AM."
#[must_use]
pub fn describe_time(now: NaiveDateTime) -> String {
    format!(
        "Today is {}, {}. The current time is {}.",
        now.format("%A"),
        now.format("%B %d, %Y"),
        now.format("%I:%M %p")
    )
}

#[async_trait]
impl Action for ClockTool {
    async fn run(&self, _args: &ActionArgs, _ctx: &ActionContext) -> Result<String> {
        let text = describe_time((self.clock)());
        tracing::info!(%text, "time and date retrieved");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ArgValue;
    use crate::testsupport;
    use chrono::NaiveDate;

    /// Wednesday, 2026-10-14 14:05
    fn wednesday() -> Clock {
        Arc::new(|| {
            NaiveDate::from_ymd_opt(2026, 10, 14)
                .and_then(|d| d.and_hms_opt(14, 5, 0))
                .unwrap()
        })
    }

    fn args(day: Option<&str>) -> ActionArgs {
        ActionArgs::from_values(day.map(|d| ("day".to_string(), ArgValue::from(d))))
    }

    #[tokio::test]
    async fn monday_lists_classes() {
        let tool = ScheduleTool::new(HashMap::new(), wednesday());
        let text = tool.run(&args(Some("monday")), &testsupport::context()).await.unwrap();
        assert!(text.starts_with("Your schedule for Monday: "));
        assert!(text.contains("Algorithm class"));
        assert!(text.contains("DSA class"));
    }

    #[tokio::test]
    async fn day_names_are_case_insensitive_and_short() {
        let tool = ScheduleTool::new(HashMap::new(), wednesday());
        let ctx = testsupport::context();
        let full = tool.run(&args(Some(" FRIDAY ")), &ctx).await.unwrap();
        let short = tool.run(&args(Some("fri")), &ctx).await.unwrap();
        assert_eq!(full, short);
    }

    #[tokio::test]
    async fn missing_day_means_today() {
        let tool = ScheduleTool::new(HashMap::new(), wednesday());
        let ctx = testsupport::context();
        let text = tool.run(&args(None), &ctx).await.unwrap();
        assert!(text.starts_with("Your schedule for Wednesday:"));
        assert_eq!(text, tool.run(&args(Some("today")), &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn sunday_uses_honorific() {
        let tool = ScheduleTool::new(HashMap::new(), wednesday());
        let text = tool.run(&args(Some("sunday")), &testsupport::context()).await.unwrap();
        assert_eq!(
            text,
            "Your schedule for Sunday: You are free today, Boss. Time to relax or revise!"
        );
    }

    #[tokio::test]
    async fn overrides_replace_default() {
        let overrides = HashMap::from([(Weekday::Mon, "Gym at 7 AM.".to_string())]);
        let tool = ScheduleTool::new(overrides, wednesday());
        let text = tool.run(&args(Some("monday")), &testsupport::context()).await.unwrap();
        assert_eq!(text, "Your schedule for Monday: Gym at 7 AM.");
    }

    #[tokio::test]
    async fn unknown_day_is_rejected() {
        let tool = ScheduleTool::new(HashMap::new(), wednesday());
        let err = tool.run(&args(Some("someday")), &testsupport::context()).await.unwrap_err();
        assert!(matches!(err, Error::Rejected(ref m) if m.contains("monday, tuesday")));
    }

    #[test]
    fn describes_time_in_spoken_form() {
        assert_eq!(
            describe_time(wednesday()()),
            "Today is Wednesday, October 14, 2026. The current time is 02:05 PM."
        );
    }
}
