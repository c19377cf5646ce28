//! End-to-end tests for the full portierd stack.
//!
//! Each test wires the real rule set, resolver, holiday calendar and door
//! scheduler to a virtual door and drives them with paused tokio time. No
//! broker is contacted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Weekday};
use portier_adapter_virtual::{StaticHolidayCalendar, VirtualDoor};
use portier_app::resolver::OpeningHoursResolver;
use portier_app::scheduler::{DoorScheduler, SchedulerConfig};
use portier_domain::daytime::{DayTime, DayTimeRange};
use portier_domain::door::{DoorCommand, DoorState};
use portier_domain::error::SchedulerError;
use portier_domain::opening_hours::{OpeningHour, RuleSet};
use portier_domain::time::{self, local_date};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

type Scheduler = DoorScheduler<Arc<VirtualDoor>, StaticHolidayCalendar>;

fn whole_day() -> OpeningHour {
    OpeningHour::new(
        DayTimeRange::new(DayTime::MIDNIGHT, DayTime::new(23, 59).unwrap()).unwrap(),
    )
    .close_after(TimeDelta::minutes(1))
}

/// Open around the clock on every regular day, closed on holidays.
fn open_every_day() -> RuleSet {
    let mut builder = RuleSet::builder();
    for weekday in WEEK {
        builder.add_regular(weekday, whole_day());
    }
    builder.build().unwrap()
}

fn calendar() -> StaticHolidayCalendar {
    StaticHolidayCalendar::new("AT")
}

/// A calendar where today and tomorrow are holidays.
fn calendar_with_holiday_now() -> StaticHolidayCalendar {
    let today = local_date(time::now(), chrono_tz::UTC);
    calendar()
        .with_fixed(today)
        .with_fixed(today.succ_opt().unwrap())
}

fn app(rules: RuleSet, holidays: StaticHolidayCalendar) -> (Arc<VirtualDoor>, Scheduler) {
    let door = Arc::new(VirtualDoor::new());
    let resolver = OpeningHoursResolver::new(rules, chrono_tz::UTC, "AT", holidays);
    let config = SchedulerConfig {
        max_tries_locked: 6,
        max_tries_unlocked: 2,
        ..SchedulerConfig::default()
    };
    let scheduler = DoorScheduler::new(Arc::clone(&door), resolver, config);
    scheduler.start().unwrap();
    (door, scheduler)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_unlock_during_opening_hours() {
    let (door, scheduler) = app(open_every_day(), calendar());
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    let status = scheduler.current();
    assert_eq!(status.state, DoorState::Unlocked);
    assert!(status.valid_until.is_some());
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_keep_door_locked_without_opening_hours() {
    let (door, scheduler) = app(RuleSet::builder().build().unwrap(), calendar());
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Locked));
    assert_eq!(scheduler.current().valid_until, None);
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_stay_locked_on_holidays_without_holiday_hours() {
    let (door, scheduler) = app(open_every_day(), calendar_with_holiday_now());
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Locked));
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_use_holiday_hours_on_holidays() {
    let mut builder = RuleSet::builder();
    builder.add_holiday(whole_day().applies_to_holidays(true));
    let (door, scheduler) = app(builder.build().unwrap(), calendar_with_holiday_now());
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_fall_back_to_regular_hours_for_unknown_country() {
    let holidays = StaticHolidayCalendar::new("DE").with_fixed(local_date(time::now(), chrono_tz::UTC));
    let (door, scheduler) = app(open_every_day(), holidays);
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Manual control
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_follow_overwrite_then_return_to_schedule_on_reset() {
    let (door, scheduler) = app(open_every_day(), calendar());
    settle().await;

    let until = time::now() + TimeDelta::hours(2);
    scheduler
        .overwrite(DoorState::Locked, until, "front-desk")
        .await
        .unwrap();
    settle().await;
    assert_eq!(door.lock_state(), Some(DoorState::Locked));
    assert_eq!(
        scheduler.current().overwrite.map(|o| o.issued_by),
        Some("front-desk".to_string())
    );

    scheduler.reset().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let status = scheduler.current();
    assert!(status.overwrite.is_none());
    assert!(!status.reset_in_progress);
    assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_buzz_door_open_without_changing_lock_state() {
    let (door, scheduler) = app(RuleSet::builder().build().unwrap(), calendar());
    settle().await;

    scheduler.open().await.unwrap();

    assert_eq!(door.commands().last(), Some(&DoorCommand::Open));
    assert_eq!(door.lock_state(), Some(DoorState::Locked));
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_swap_opening_hours_on_reload() {
    let (door, scheduler) = app(RuleSet::builder().build().unwrap(), calendar());
    settle().await;
    assert_eq!(door.lock_state(), Some(DoorState::Locked));

    let resolver = OpeningHoursResolver::new(open_every_day(), chrono_tz::UTC, "AT", calendar());
    scheduler.replace_resolver(resolver).await.unwrap();
    settle().await;

    assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    scheduler.stop().await;
}

// ---------------------------------------------------------------------------
// Failures and lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_retry_after_door_comes_back_online() {
    let door = Arc::new(VirtualDoor::new());
    door.set_offline(true);
    let resolver = OpeningHoursResolver::new(
        RuleSet::builder().build().unwrap(),
        chrono_tz::UTC,
        "AT",
        calendar(),
    );
    let scheduler = DoorScheduler::new(Arc::clone(&door), resolver, SchedulerConfig::default());
    scheduler.start().unwrap();
    settle().await;
    assert!(door.commands().is_empty());

    door.set_offline(false);
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(door.lock_state(), Some(DoorState::Locked));
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_refuse_requests_once_stopped() {
    let (door, scheduler) = app(open_every_day(), calendar());
    settle().await;
    scheduler.stop().await;
    let sent = door.commands().len();

    let until = time::now() + TimeDelta::hours(1);
    let result = scheduler.overwrite(DoorState::Locked, until, "front-desk").await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(result, Err(SchedulerError::Stopped));
    assert_eq!(door.commands().len(), sent);
}
