//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Every select template lists its columns explicitly and
//! is suffixed per call with a `WHERE` clause or the list-query suffix.
//! List-valued membership (queue calls, chained calls, recordings) lives in
//! child tables and is folded back into JSON arrays by the templates.

/// SQL statement to create all tables. Idempotent.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    detail TEXT NOT NULL DEFAULT '',
    balance REAL NOT NULL DEFAULT 0,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    detail TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    phone_number TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    billing_account_id TEXT NOT NULL,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS queues (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    detail TEXT NOT NULL DEFAULT '',
    routing_method TEXT NOT NULL DEFAULT '',
    tag_ids TEXT,
    wait_actions TEXT,
    wait_timeout INTEGER NOT NULL DEFAULT 0,
    service_timeout INTEGER NOT NULL DEFAULT 0,
    total_incoming_count INTEGER NOT NULL DEFAULT 0,
    total_serviced_count INTEGER NOT NULL DEFAULT 0,
    total_abandoned_count INTEGER NOT NULL DEFAULT 0,
    total_wait_duration INTEGER NOT NULL DEFAULT 0,
    total_service_duration INTEGER NOT NULL DEFAULT 0,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL
);

-- Waiting and in-service queuecalls of a queue, in arrival order
CREATE TABLE IF NOT EXISTS queue_queuecalls (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_id TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('wait', 'service')),
    queuecall_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS calls (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    channel_id TEXT NOT NULL DEFAULT '',
    bridge_id TEXT NOT NULL DEFAULT '',
    flow_id TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    direction TEXT NOT NULL DEFAULT '',
    source TEXT,
    destination TEXT,
    data TEXT,
    master_call_id TEXT NOT NULL,
    recording_id TEXT NOT NULL,
    hangup_by TEXT NOT NULL DEFAULT '',
    hangup_reason TEXT NOT NULL DEFAULT '',
    tm_ringing TEXT NOT NULL,
    tm_progressing TEXT NOT NULL,
    tm_hangup TEXT NOT NULL,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS call_chained_calls (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    call_id TEXT NOT NULL,
    chained_call_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS call_recordings (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    call_id TEXT NOT NULL,
    recording_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    tech TEXT NOT NULL DEFAULT '',
    bridge_id TEXT NOT NULL DEFAULT '',
    stasis_name TEXT NOT NULL DEFAULT '',
    state TEXT NOT NULL,
    data TEXT,
    hangup_cause INTEGER NOT NULL DEFAULT 0,
    tm_answer TEXT NOT NULL,
    tm_ringing TEXT NOT NULL,
    tm_end TEXT NOT NULL,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL
);

-- Rows are removed on delete; tm_delete only keeps list filtering uniform
CREATE TABLE IF NOT EXISTS sip_auths (
    id TEXT PRIMARY KEY,
    auth_types TEXT,
    realm TEXT NOT NULL DEFAULT '',
    username TEXT NOT NULL,
    password TEXT NOT NULL DEFAULT '',
    allowed_ips TEXT,
    tm_create TEXT NOT NULL,
    tm_update TEXT NOT NULL,
    tm_delete TEXT NOT NULL DEFAULT '9999-01-01 00:00:00.000000'
);

CREATE INDEX IF NOT EXISTS idx_accounts_create ON accounts(tm_create);
CREATE INDEX IF NOT EXISTS idx_accounts_customer ON accounts(customer_id);
CREATE INDEX IF NOT EXISTS idx_customers_create ON customers(tm_create);
CREATE INDEX IF NOT EXISTS idx_customers_email ON customers(email);
CREATE INDEX IF NOT EXISTS idx_queues_create ON queues(tm_create);
CREATE INDEX IF NOT EXISTS idx_queues_customer ON queues(customer_id);
CREATE INDEX IF NOT EXISTS idx_queue_queuecalls_queue ON queue_queuecalls(queue_id, kind, seq);
CREATE INDEX IF NOT EXISTS idx_calls_create ON calls(tm_create);
CREATE INDEX IF NOT EXISTS idx_calls_channel ON calls(channel_id);
CREATE INDEX IF NOT EXISTS idx_call_chained_calls_call ON call_chained_calls(call_id, seq);
CREATE INDEX IF NOT EXISTS idx_call_recordings_call ON call_recordings(call_id, seq);
CREATE INDEX IF NOT EXISTS idx_channels_create ON channels(tm_create);
CREATE INDEX IF NOT EXISTS idx_sip_auths_create ON sip_auths(tm_create);
"#;

// ============================================================================
// Account queries
// ============================================================================

macro_rules! account_select {
    () => {
        "SELECT id, customer_id, name, detail, balance, tm_create, tm_update, tm_delete \
         FROM accounts"
    };
}

pub const SELECT_ACCOUNTS: &str = account_select!();

pub const SELECT_ACCOUNT_BY_ID: &str = concat!(account_select!(), " WHERE id = ?");

pub const ACCOUNT_FILTERS: &[&str] = &["customer_id", "name"];

pub const INSERT_ACCOUNT: &str = r#"
INSERT INTO accounts (id, customer_id, name, detail, balance, tm_create, tm_update, tm_delete)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
"#;

pub const UPDATE_ACCOUNT_BASIC_INFO: &str =
    "UPDATE accounts SET name = ?1, detail = ?2, tm_update = ?3 WHERE id = ?4";

pub const UPDATE_ACCOUNT_ADD_BALANCE: &str =
    "UPDATE accounts SET balance = balance + ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_ACCOUNT_SUBTRACT_BALANCE: &str =
    "UPDATE accounts SET balance = balance - ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_ACCOUNT_SUBTRACT_BALANCE_CHECKED: &str =
    "UPDATE accounts SET balance = balance - ?1, tm_update = ?2 WHERE id = ?3 AND balance >= ?1";

pub const EXISTS_ACCOUNT: &str = "SELECT 1 FROM accounts WHERE id = ?";

pub const DELETE_ACCOUNT: &str =
    "UPDATE accounts SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2";

// ============================================================================
// Customer queries
// ============================================================================

macro_rules! customer_select {
    () => {
        "SELECT id, name, detail, email, phone_number, address, billing_account_id, \
         tm_create, tm_update, tm_delete FROM customers"
    };
}

pub const SELECT_CUSTOMERS: &str = customer_select!();

pub const SELECT_CUSTOMER_BY_ID: &str = concat!(customer_select!(), " WHERE id = ?");

pub const SELECT_CUSTOMER_BY_EMAIL: &str = concat!(
    customer_select!(),
    " WHERE email = ? ORDER BY tm_create DESC LIMIT 1"
);

pub const CUSTOMER_FILTERS: &[&str] = &["name", "email", "phone_number", "billing_account_id"];

pub const INSERT_CUSTOMER: &str = r#"
INSERT INTO customers (
    id, name, detail, email, phone_number, address, billing_account_id,
    tm_create, tm_update, tm_delete
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
"#;

pub const UPDATE_CUSTOMER_BASIC_INFO: &str = r#"
UPDATE customers SET
    name = ?1, detail = ?2, email = ?3, phone_number = ?4, address = ?5, tm_update = ?6
WHERE id = ?7
"#;

pub const UPDATE_CUSTOMER_BILLING_ACCOUNT_ID: &str =
    "UPDATE customers SET billing_account_id = ?1, tm_update = ?2 WHERE id = ?3";

pub const DELETE_CUSTOMER: &str =
    "UPDATE customers SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2";

// ============================================================================
// Queue queries
// ============================================================================

macro_rules! queue_select {
    () => {
        "SELECT id, customer_id, name, detail, routing_method, tag_ids, wait_actions, \
         wait_timeout, service_timeout, \
         (SELECT json_group_array(queuecall_id ORDER BY seq) FROM queue_queuecalls \
          WHERE queue_queuecalls.queue_id = queues.id AND kind = 'wait') AS wait_queuecall_ids, \
         (SELECT json_group_array(queuecall_id ORDER BY seq) FROM queue_queuecalls \
          WHERE queue_queuecalls.queue_id = queues.id AND kind = 'service') AS service_queuecall_ids, \
         total_incoming_count, total_serviced_count, total_abandoned_count, \
         total_wait_duration, total_service_duration, tm_create, tm_update, tm_delete \
         FROM queues"
    };
}

pub const SELECT_QUEUES: &str = queue_select!();

pub const SELECT_QUEUE_BY_ID: &str = concat!(queue_select!(), " WHERE id = ?");

pub const QUEUE_FILTERS: &[&str] = &["customer_id", "name", "routing_method"];

pub const INSERT_QUEUE: &str = r#"
INSERT INTO queues (
    id, customer_id, name, detail, routing_method, tag_ids, wait_actions,
    wait_timeout, service_timeout,
    total_incoming_count, total_serviced_count, total_abandoned_count,
    total_wait_duration, total_service_duration,
    tm_create, tm_update, tm_delete
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)
"#;

pub const INSERT_QUEUE_QUEUECALL: &str =
    "INSERT INTO queue_queuecalls (queue_id, kind, queuecall_id) VALUES (?1, ?2, ?3)";

/// Removes the oldest matching entry only.
pub const DELETE_QUEUE_QUEUECALL: &str = r#"
DELETE FROM queue_queuecalls WHERE seq = (
    SELECT min(seq) FROM queue_queuecalls
    WHERE queue_id = ?1 AND kind = ?2 AND queuecall_id = ?3
)
"#;

pub const UPDATE_QUEUE_BASIC_INFO: &str =
    "UPDATE queues SET name = ?1, detail = ?2, tm_update = ?3 WHERE id = ?4";

pub const UPDATE_QUEUE_ROUTING_METHOD: &str =
    "UPDATE queues SET routing_method = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_QUEUE_TAG_IDS: &str =
    "UPDATE queues SET tag_ids = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_QUEUE_WAIT_ACTIONS_AND_TIMEOUTS: &str = r#"
UPDATE queues SET
    wait_actions = ?1, wait_timeout = ?2, service_timeout = ?3, tm_update = ?4
WHERE id = ?5
"#;

pub const UPDATE_QUEUE_INCOMING: &str = r#"
UPDATE queues SET
    total_incoming_count = total_incoming_count + 1, tm_update = ?1
WHERE id = ?2
"#;

pub const UPDATE_QUEUE_SERVICED: &str = r#"
UPDATE queues SET
    total_serviced_count = total_serviced_count + 1,
    total_wait_duration = total_wait_duration + ?1,
    tm_update = ?2
WHERE id = ?3
"#;

pub const UPDATE_QUEUE_ABANDONED: &str = r#"
UPDATE queues SET
    total_abandoned_count = total_abandoned_count + 1,
    total_wait_duration = total_wait_duration + ?1,
    tm_update = ?2
WHERE id = ?3
"#;

pub const UPDATE_QUEUE_SERVICE_DURATION: &str = r#"
UPDATE queues SET
    total_service_duration = total_service_duration + ?1, tm_update = ?2
WHERE id = ?3
"#;

pub const SELECT_QUEUE_EXISTS: &str = "SELECT 1 FROM queues WHERE id = ?1";

pub const UPDATE_QUEUE_TOUCH: &str = "UPDATE queues SET tm_update = ?1 WHERE id = ?2";

pub const DELETE_QUEUE: &str = "UPDATE queues SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2";

// ============================================================================
// Call queries
// ============================================================================

macro_rules! call_select {
    () => {
        "SELECT id, customer_id, channel_id, bridge_id, flow_id, type, status, direction, \
         source, destination, data, master_call_id, \
         (SELECT json_group_array(chained_call_id ORDER BY seq) FROM call_chained_calls \
          WHERE call_chained_calls.call_id = calls.id) AS chained_call_ids, \
         recording_id, \
         (SELECT json_group_array(recording_id ORDER BY seq) FROM call_recordings \
          WHERE call_recordings.call_id = calls.id) AS recording_ids, \
         hangup_by, hangup_reason, tm_ringing, tm_progressing, tm_hangup, \
         tm_create, tm_update, tm_delete \
         FROM calls"
    };
}

pub const SELECT_CALLS: &str = call_select!();

pub const SELECT_CALL_BY_ID: &str = concat!(call_select!(), " WHERE id = ?");

pub const SELECT_CALL_BY_CHANNEL_ID: &str = concat!(
    call_select!(),
    " WHERE channel_id = ? ORDER BY tm_create DESC LIMIT 1"
);

pub const CALL_FILTERS: &[&str] = &[
    "customer_id",
    "channel_id",
    "bridge_id",
    "flow_id",
    "type",
    "status",
    "direction",
    "master_call_id",
];

pub const INSERT_CALL: &str = r#"
INSERT INTO calls (
    id, customer_id, channel_id, bridge_id, flow_id, type, status, direction,
    source, destination, data, master_call_id, recording_id, hangup_by, hangup_reason,
    tm_ringing, tm_progressing, tm_hangup, tm_create, tm_update, tm_delete
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16, ?16, ?17, ?16, ?16)
"#;

pub const INSERT_CALL_CHAINED_CALL: &str =
    "INSERT INTO call_chained_calls (call_id, chained_call_id) VALUES (?1, ?2)";

pub const DELETE_CALL_CHAINED_CALL: &str = r#"
DELETE FROM call_chained_calls WHERE seq = (
    SELECT min(seq) FROM call_chained_calls WHERE call_id = ?1 AND chained_call_id = ?2
)
"#;

pub const INSERT_CALL_RECORDING: &str =
    "INSERT INTO call_recordings (call_id, recording_id) VALUES (?1, ?2)";

pub const UPDATE_CALL_BRIDGE_ID: &str =
    "UPDATE calls SET bridge_id = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CALL_STATUS: &str = "UPDATE calls SET status = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CALL_STATUS_RINGING: &str =
    "UPDATE calls SET status = 'ringing', tm_update = ?1, tm_ringing = ?1 WHERE id = ?2";

pub const UPDATE_CALL_STATUS_PROGRESSING: &str =
    "UPDATE calls SET status = 'progressing', tm_update = ?1, tm_progressing = ?1 WHERE id = ?2";

pub const UPDATE_CALL_HANGUP: &str = r#"
UPDATE calls SET
    status = 'hangup', hangup_by = ?1, hangup_reason = ?2, tm_update = ?3, tm_hangup = ?3
WHERE id = ?4
"#;

pub const UPDATE_CALL_MASTER_CALL_ID: &str =
    "UPDATE calls SET master_call_id = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CALL_RECORDING_ID: &str =
    "UPDATE calls SET recording_id = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CALL_DATA: &str = "UPDATE calls SET data = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CALL_TOUCH: &str = "UPDATE calls SET tm_update = ?1 WHERE id = ?2";

pub const DELETE_CALL: &str = "UPDATE calls SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2";

// ============================================================================
// Channel queries
// ============================================================================

macro_rules! channel_select {
    () => {
        "SELECT id, name, tech, bridge_id, stasis_name, state, data, hangup_cause, \
         tm_answer, tm_ringing, tm_end, tm_create, tm_update, tm_delete FROM channels"
    };
}

pub const SELECT_CHANNELS: &str = channel_select!();

pub const SELECT_CHANNEL_BY_ID: &str = concat!(channel_select!(), " WHERE id = ?");

pub const CHANNEL_FILTERS: &[&str] = &["name", "tech", "bridge_id", "stasis_name", "state"];

pub const INSERT_CHANNEL: &str = r#"
INSERT INTO channels (
    id, name, tech, bridge_id, stasis_name, state, data, hangup_cause,
    tm_answer, tm_ringing, tm_end, tm_create, tm_update, tm_delete
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?9, ?10, ?9, ?9)
"#;

pub const UPDATE_CHANNEL_STASIS_NAME: &str =
    "UPDATE channels SET stasis_name = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CHANNEL_BRIDGE_ID: &str =
    "UPDATE channels SET bridge_id = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CHANNEL_STATE: &str =
    "UPDATE channels SET state = ?1, tm_update = ?2 WHERE id = ?3";

pub const UPDATE_CHANNEL_STATE_ANSWER: &str =
    "UPDATE channels SET state = ?1, tm_update = ?2, tm_answer = ?2 WHERE id = ?3";

pub const UPDATE_CHANNEL_STATE_RINGING: &str =
    "UPDATE channels SET state = ?1, tm_update = ?2, tm_ringing = ?2 WHERE id = ?3";

pub const UPDATE_CHANNEL_DATA: &str =
    "UPDATE channels SET data = ?1, tm_update = ?2 WHERE id = ?3";

/// Sets one top-level key of `data`. The path is bound, never interpolated.
pub const UPDATE_CHANNEL_DATA_ITEM: &str = r#"
UPDATE channels SET
    data = json_set(coalesce(nullif(data, ''), '{}'), ?1, json(?2)),
    tm_update = ?3
WHERE id = ?4
"#;

pub const UPDATE_CHANNEL_HANGUP: &str = r#"
UPDATE channels SET
    hangup_cause = ?1, tm_update = ?2, tm_end = ?2, tm_delete = ?2
WHERE id = ?3
"#;

pub const DELETE_CHANNEL: &str =
    "UPDATE channels SET tm_update = ?1, tm_delete = ?1 WHERE id = ?2";

// ============================================================================
// SIP auth queries
// ============================================================================

macro_rules! sip_auth_select {
    () => {
        "SELECT id, auth_types, realm, username, password, allowed_ips, tm_create, tm_update \
         FROM sip_auths"
    };
}

pub const SELECT_SIP_AUTHS: &str = sip_auth_select!();

pub const SELECT_SIP_AUTH_BY_ID: &str = concat!(sip_auth_select!(), " WHERE id = ?");

pub const SIP_AUTH_FILTERS: &[&str] = &["realm", "username"];

pub const INSERT_SIP_AUTH: &str = r#"
INSERT INTO sip_auths (id, auth_types, realm, username, password, allowed_ips, tm_create, tm_update)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const UPDATE_SIP_AUTH: &str = r#"
UPDATE sip_auths SET
    auth_types = ?1, realm = ?2, username = ?3, password = ?4, allowed_ips = ?5, tm_update = ?6
WHERE id = ?7
"#;

pub const DELETE_SIP_AUTH: &str = "DELETE FROM sip_auths WHERE id = ?";
