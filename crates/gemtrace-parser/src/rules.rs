use crate::scanner::BodyScanner;
use chrono::{NaiveDateTime, TimeDelta};
use gemtrace_kb::KnowledgeBase;
use gemtrace_types::{
    IdReadResult, Meaning, MessageFields, MessageRecord, ResolvedEvent, SvidReading,
};
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

// NOTE: Extraction Rule Design
//
// Rules are total: a sub-pattern that does not match leaves the record's
// typed fields unset and the text in the remainder. No rule errors, and no
// rule may consume text it did not map onto a field. Dispatch is data
// (HashMap registries), so supporting a new message type or event is an
// insertion, never an edit to traversal code.

/// Unsigned integer item, e.g. `<U4 [1] 181>`.
static UINT_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*U\d\s*\[\d+\]\s*(\d+)\s*>").unwrap());

/// Any quoted item; some firmware quotes numeric U items too.
static QUOTED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*(?:A|U\d)\s*\[\d+\]\s*'([^']*)'\s*>").unwrap());

/// ASCII item only, e.g. `<A [12] 'Interlock'>`.
static ASCII_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*A\s*\[\d+\]\s*'([^']*)'\s*>").unwrap());

/// Remote command token: uppercase, five characters or more.
static RCMD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*A\s*\[\d+\]\s*'([A-Z_]{5,})'\s*>").unwrap());

/// Command parameter pair: `<L [2] <A 'NAME'> <A|Ux 'VALUE'>>`.
static PARAM_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*L\s*\[2\]\s*<A\s*\[\d+\]\s*'([^']+)'>\s*<(?:A|U\d)\s*\[\d+\]\s*'([^']*)'>\s*>")
        .unwrap()
});

/// Port id directly followed by a three-letter state code.
static PORT_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*U1\s*\[1\]\s*(\d+)\s*>\s*<\s*A\s*\[3\]\s*'(\w+)'\s*>").unwrap()
});

/// Status variable pair: `<L [2] <U4 [1] SVID> <A [n] 'VALUE'>>`.
static SVID_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*L\s*\[2\]\s*<\s*U\d\s*\[\d+\]\s*(\d+)\s*>\s*<\s*A\s*\[\d+\]\s*'([^']*)'\s*>\s*>")
        .unwrap()
});

/// Equipment clock item: 14 digits, optionally 1-2 fractional digits.
static BODY_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*A\s*\[\d+\]\s*'(\d{14,16})'\s*>").unwrap());

/// Alarm code byte (ALCD); bit 7 distinguishes set from clear.
static ALARM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*B\s*\[\d+\]\s*0x([0-9A-Fa-f]{1,2})\s*>").unwrap());

static LABELED_OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'OPERATORID'>\s*<A\s*\[\d+\]\s*'(\w+)'").unwrap());

static LABELED_MAGAZINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'MAGAZINEID'>\s*<A\s*\[\d+\]\s*'([\w-]+)'").unwrap());

/// Rule for one message type.
pub type RuleFn = fn(&mut BodyScanner<'_>, &RuleContext<'_>, &mut MessageRecord);

/// Sub-rule for one resolved event within an event report.
pub type EventRuleFn = fn(&mut BodyScanner<'_>, &RuleContext<'_>, &EventScope, &mut MessageRecord);

/// What a rule gets to work with besides the body itself.
pub struct RuleContext<'a> {
    pub kb: &'a KnowledgeBase,
    pub rules: &'a RuleSet,
}

/// The event an event-report rule resolved, for its sub-rule.
pub struct EventScope {
    pub code: u32,
    pub name: Meaning,
    /// Span of the consumed CEID item; alarm ids follow it.
    pub ceid_range: Range<usize>,
}

impl EventScope {
    pub fn is(&self, name: &str) -> bool {
        self.name.known() == Some(name)
    }
}

/// Dispatch registry mapping message types and event names to rules.
pub struct RuleSet {
    by_type: HashMap<String, RuleFn>,
    by_event: HashMap<String, EventRuleFn>,
}

impl RuleSet {
    pub fn empty() -> Self {
        RuleSet {
            by_type: HashMap::new(),
            by_event: HashMap::new(),
        }
    }

    /// The rules for the loadport GEM dialect.
    pub fn standard() -> Self {
        let mut rules = Self::empty();
        rules.register("S6F11", event_report);
        rules.register("S2F49", remote_command);
        rules.register("S5F1", alarm_report);
        rules.register("S2F31", clock_body);
        rules.register("S2F32", clock_body);

        rules.register_event("PortStatusChange", port_status);
        rules.register_event("IDRead", id_read);
        rules.register_event("MagazineDocked", magazine_docked);
        rules.register_event("AlarmSet", alarm_event);
        rules.register_event("AlarmClear", alarm_event);
        rules.register_event("GemPPChangeEvent", svid_change);
        rules
    }

    pub fn register(&mut self, message_type: impl Into<String>, rule: RuleFn) {
        self.by_type.insert(message_type.into(), rule);
    }

    pub fn register_event(&mut self, event_name: impl Into<String>, rule: EventRuleFn) {
        self.by_event.insert(event_name.into(), rule);
    }

    pub fn rule_for(&self, message_type: &str) -> Option<RuleFn> {
        self.by_type.get(message_type).copied()
    }

    pub fn event_rule(&self, event_name: &str) -> Option<EventRuleFn> {
        self.by_event.get(event_name).copied()
    }
}

/// S6F11 event report: find the CEID by scanning unsigned items against
/// the event table (layouts vary, so position cannot be trusted), then let
/// the event's sub-rule pick its fields apart.
fn event_report(scanner: &mut BodyScanner<'_>, ctx: &RuleContext<'_>, record: &mut MessageRecord) {
    let found = scanner.scan(&UINT_ITEM).into_iter().find_map(|hit| {
        let code: u32 = hit.group(1)?.parse().ok()?;
        ctx.kb.is_event(code).then_some((hit.range, code))
    });
    let Some((ceid_range, code)) = found else {
        // Nothing recognizable; the whole body stays in the remainder.
        return;
    };
    scanner.consume(ceid_range.clone());

    let name = ctx.kb.event_name(code);
    record.event = Some(ResolvedEvent {
        code,
        name: name.clone(),
    });

    let scope = EventScope {
        code,
        name,
        ceid_range,
    };
    let sub_rule = scope
        .name
        .known()
        .and_then(|event_name| ctx.rules.event_rule(event_name))
        .unwrap_or(generic_event);
    sub_rule(scanner, ctx, &scope, record);

    scan_body_clock(scanner, record);
}

/// S2F49 remote command: validate the RCMD token against the command
/// table, then map recognized `<L [2] <A 'NAME'> <'VALUE'>>` parameter
/// pairs onto typed fields. Unrecognized pairs stay in the remainder.
fn remote_command(
    scanner: &mut BodyScanner<'_>,
    ctx: &RuleContext<'_>,
    record: &mut MessageRecord,
) {
    let command = scanner.scan(&RCMD_TOKEN).into_iter().find(|hit| {
        hit.group(1)
            .map(|name| ctx.kb.is_command(name))
            .unwrap_or(false)
    });
    let Some(command) = command else { return };
    record.command = command.group(1).map(str::to_string);
    scanner.consume(command.range.clone());

    for pair in scanner.scan(&PARAM_PAIR) {
        if !scanner.is_available(&pair.range) {
            continue;
        }
        let key = pair.group(1).unwrap_or("");
        let value = pair.group(2).unwrap_or("");
        if apply_command_parameter(&mut record.fields, key, value) {
            scanner.consume(pair.range.clone());
        }
    }
}

fn apply_command_parameter(fields: &mut MessageFields, key: &str, value: &str) -> bool {
    match key {
        "LOTID" => fields.lot_id = Some(value.to_string()),
        "MAGAZINEID" => fields.magazine_id = Some(value.to_string()),
        "OPERATORID" => fields.operator_id = Some(value.to_string()),
        "PANELID" => fields.panel_id = Some(value.to_string()),
        "PORTID" => match value.parse() {
            Ok(port) => fields.port_id = Some(port),
            Err(_) => return false,
        },
        "SRCPORTID" => match value.parse() {
            Ok(port) => fields.source_port_id = Some(port),
            Err(_) => return false,
        },
        "DESTPORTID" => match value.parse() {
            Ok(port) => fields.destination_port_id = Some(port),
            Err(_) => return false,
        },
        _ => return false,
    }
    true
}

/// S5F1 alarm report: ALCD byte (bit 7 = set), ALID, then the alarm text
/// from the body when present, from the ALID table otherwise.
fn alarm_report(scanner: &mut BodyScanner<'_>, ctx: &RuleContext<'_>, record: &mut MessageRecord) {
    if let Some(hit) = scanner.take(&ALARM_CODE)
        && let Some(code) = hit.group(1).and_then(|s| u8::from_str_radix(s, 16).ok())
    {
        record.fields.alarm_set = Some(code & 0x80 != 0);
    }

    if let Some(hit) = scanner.take(&UINT_ITEM)
        && let Some(alid) = hit.group(1).and_then(|s| s.parse::<u32>().ok())
    {
        record.fields.alarm_id = Some(alid);
    }

    let body_text = scanner
        .take(&ASCII_ITEM)
        .and_then(|hit| hit.group(1).map(str::to_string))
        .filter(|text| !text.is_empty());
    record.fields.alarm_text = match (body_text, record.fields.alarm_id) {
        (Some(text), _) => Some(Meaning::Known(text)),
        (None, Some(alid)) => Some(ctx.kb.alarm_text(alid)),
        (None, None) => None,
    };
}

/// S2F31/S2F32: the body is a clock item.
fn clock_body(scanner: &mut BodyScanner<'_>, _ctx: &RuleContext<'_>, record: &mut MessageRecord) {
    scan_body_clock(scanner, record);
}

fn port_status(
    scanner: &mut BodyScanner<'_>,
    _ctx: &RuleContext<'_>,
    _scope: &EventScope,
    record: &mut MessageRecord,
) {
    if let Some(hit) = scanner.take(&PORT_STATUS) {
        record.fields.port_id = hit.group(1).and_then(|s| s.parse().ok());
        record.fields.port_state = hit.group(2).map(str::to_string);
    }
}

/// IDRead carries positional quoted fields: clock, lot, panel,
/// orientation, result code, then optionally the slot.
fn id_read(
    scanner: &mut BodyScanner<'_>,
    ctx: &RuleContext<'_>,
    _scope: &EventScope,
    record: &mut MessageRecord,
) {
    let hits = scanner.scan(&QUOTED_ITEM);
    if hits.len() < 5 {
        return;
    }
    let value = |i: usize| hits[i].group(1).unwrap_or("").to_string();

    record.fields.lot_id = Some(value(1));
    record.fields.panel_id = Some(value(2));
    record.fields.orientation = Some(value(3));
    let code = value(4);
    record.fields.id_read = Some(IdReadResult {
        meaning: ctx.kb.id_read_result(&code),
        code,
    });

    let last = if hits.len() > 5 {
        record.fields.slot_info = Some(value(5));
        5
    } else {
        4
    };
    for hit in &hits[1..=last] {
        scanner.consume(hit.range.clone());
    }
}

/// MagazineDocked: the port id is the second unsigned item, the magazine
/// and operator the second and third quoted items.
fn magazine_docked(
    scanner: &mut BodyScanner<'_>,
    _ctx: &RuleContext<'_>,
    _scope: &EventScope,
    record: &mut MessageRecord,
) {
    let uints = scanner.scan(&UINT_ITEM);
    let quoted = scanner.scan(&QUOTED_ITEM);
    if uints.len() < 2 || quoted.len() < 3 {
        return;
    }

    record.fields.port_id = uints[1].group(1).and_then(|s| s.parse().ok());
    record.fields.magazine_id = Some(quoted[1].group(1).unwrap_or("").to_string());
    record.fields.operator_id = Some(quoted[2].group(1).unwrap_or("").to_string());

    scanner.consume(uints[1].range.clone());
    scanner.consume(quoted[1].range.clone());
    scanner.consume(quoted[2].range.clone());
}

/// AlarmSet/AlarmClear event reports: the ALID is the unsigned item
/// following the CEID.
fn alarm_event(
    scanner: &mut BodyScanner<'_>,
    ctx: &RuleContext<'_>,
    scope: &EventScope,
    record: &mut MessageRecord,
) {
    record.fields.alarm_set = Some(scope.is("AlarmSet"));

    let hits = scanner.scan(&UINT_ITEM);
    let next = hits
        .iter()
        .find(|hit| hit.range.start >= scope.ceid_range.end && scanner.is_available(&hit.range));
    if let Some(hit) = next
        && let Some(alid) = hit.group(1).and_then(|s| s.parse::<u32>().ok())
    {
        record.fields.alarm_id = Some(alid);
        record.fields.alarm_text = Some(ctx.kb.alarm_text(alid));
        scanner.consume(hit.range.clone());
    }
}

/// GemPPChangeEvent reports often carry a status-variable change.
fn svid_change(
    scanner: &mut BodyScanner<'_>,
    ctx: &RuleContext<'_>,
    _scope: &EventScope,
    record: &mut MessageRecord,
) {
    let hits = scanner.scan(&SVID_PAIR);
    let hit = hits.iter().find(|hit| scanner.is_available(&hit.range));
    if let Some(hit) = hit
        && let Some(svid) = hit.group(1).and_then(|s| s.parse::<u32>().ok())
    {
        record.fields.status_variable = Some(SvidReading {
            svid,
            name: ctx.kb.status_variable(svid),
            value: hit.group(2).unwrap_or("").to_string(),
        });
        scanner.consume(hit.range.clone());
    }
}

/// Fallback for events with no dedicated sub-rule: pick up the labeled
/// operator/magazine pairs some reports carry.
fn generic_event(
    scanner: &mut BodyScanner<'_>,
    _ctx: &RuleContext<'_>,
    _scope: &EventScope,
    record: &mut MessageRecord,
) {
    if let Some(hit) = scanner.take(&LABELED_OPERATOR) {
        record.fields.operator_id = hit.group(1).map(str::to_string);
    }
    if let Some(hit) = scanner.take(&LABELED_MAGAZINE) {
        record.fields.magazine_id = hit.group(1).map(str::to_string);
    }
}

fn scan_body_clock(scanner: &mut BodyScanner<'_>, record: &mut MessageRecord) {
    let hits = scanner.scan(&BODY_CLOCK);
    let hit = hits.iter().find(|hit| scanner.is_available(&hit.range));
    if let Some(hit) = hit
        && let Some(clock) = hit.group(1).and_then(parse_body_clock)
    {
        record.fields.body_clock = Some(clock);
        scanner.consume(hit.range.clone());
    }
}

/// Parse an equipment clock string: `YYYYMMDDhhmmss` plus up to two
/// fractional digits.
fn parse_body_clock(digits: &str) -> Option<NaiveDateTime> {
    if !(14..=16).contains(&digits.len()) {
        return None;
    }
    let (main, frac) = digits.split_at(14);
    let base = NaiveDateTime::parse_from_str(main, "%Y%m%d%H%M%S").ok()?;
    if frac.is_empty() {
        return Some(base);
    }
    let value: i64 = frac.parse().ok()?;
    let millis = match frac.len() {
        1 => value * 100,
        2 => value * 10,
        _ => return None,
    };
    base.checked_add_signed(TimeDelta::milliseconds(millis))
}
