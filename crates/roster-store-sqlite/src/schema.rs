//! SQL schema for the Roster SQLite store.
//!
//! Contacts, raw contacts and data exist twice: once for regular contacts
//! and once, prefixed `profile_`, for the device owner's profile. Profile
//! tables draw their ids from the profile id space. Reads go through the
//! `*_view` views, which add the joined columns the platform exposes
//! (display names, owning contact and account on data rows).

use roster_core::PROFILE_MIN_ID;

/// Tables, views and triggers shared by both id spaces. `{p}` is replaced by
/// the table prefix.
const CONTACT_TABLES: &str = "
CREATE TABLE IF NOT EXISTS {p}contacts (
    _id                            INTEGER PRIMARY KEY AUTOINCREMENT,
    starred                        INTEGER DEFAULT 0,
    custom_ringtone                TEXT,
    send_to_voicemail              INTEGER DEFAULT 0,
    contact_last_updated_timestamp INTEGER
);

CREATE TABLE IF NOT EXISTS {p}raw_contacts (
    _id          INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id   INTEGER REFERENCES {p}contacts(_id) ON DELETE CASCADE,
    account_name TEXT,
    account_type TEXT
);

CREATE TABLE IF NOT EXISTS {p}data (
    _id              INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_contact_id   INTEGER NOT NULL REFERENCES {p}raw_contacts(_id) ON DELETE CASCADE,
    mimetype         TEXT NOT NULL,
    is_primary       INTEGER NOT NULL DEFAULT 0,
    is_super_primary INTEGER NOT NULL DEFAULT 0,
    -- Untyped: values keep the type they were written with.
    data1, data2, data3, data4, data5, data6, data7, data8,
    data9, data10, data11, data12, data13, data14, data15
);

CREATE INDEX IF NOT EXISTS {p}raw_contacts_contact_idx ON {p}raw_contacts(contact_id);
CREATE INDEX IF NOT EXISTS {p}data_raw_contact_idx     ON {p}data(raw_contact_id, mimetype);

-- Display names come from the name row, then organization, email, phone.
CREATE VIEW IF NOT EXISTS {p}raw_contacts_view AS
SELECT v._id, v.contact_id, v.account_name, v.account_type, v.display_name,
       COALESCE(v.name_alt, v.display_name) AS display_name_alt
FROM (
    SELECT r._id, r.contact_id, r.account_name, r.account_type,
           (SELECT d.data1 FROM {p}data d
             WHERE d.raw_contact_id = r._id AND d.data1 IS NOT NULL
               AND d.mimetype IN (
                 'vnd.android.cursor.item/name',
                 'vnd.android.cursor.item/organization',
                 'vnd.android.cursor.item/email_v2',
                 'vnd.android.cursor.item/phone_v2')
             ORDER BY CASE d.mimetype
                 WHEN 'vnd.android.cursor.item/name'         THEN 0
                 WHEN 'vnd.android.cursor.item/organization' THEN 1
                 WHEN 'vnd.android.cursor.item/email_v2'     THEN 2
                 ELSE 3 END, d._id
             LIMIT 1) AS display_name,
           (SELECT d.data3 || ', ' || d.data2 FROM {p}data d
             WHERE d.raw_contact_id = r._id
               AND d.mimetype = 'vnd.android.cursor.item/name'
               AND d.data2 IS NOT NULL AND d.data3 IS NOT NULL
             ORDER BY d._id
             LIMIT 1) AS name_alt
    FROM {p}raw_contacts r
) v;

CREATE VIEW IF NOT EXISTS {p}contacts_view AS
SELECT c._id, c.starred, c.custom_ringtone, c.send_to_voicemail,
       c.contact_last_updated_timestamp,
       (SELECT rv.display_name FROM {p}raw_contacts_view rv
         WHERE rv.contact_id = c._id AND rv.display_name IS NOT NULL
         ORDER BY rv._id LIMIT 1) AS display_name,
       (SELECT rv.display_name_alt FROM {p}raw_contacts_view rv
         WHERE rv.contact_id = c._id AND rv.display_name_alt IS NOT NULL
         ORDER BY rv._id LIMIT 1) AS display_name_alt
FROM {p}contacts c;

CREATE VIEW IF NOT EXISTS {p}data_view AS
SELECT d.*, r.contact_id, r.account_name, r.account_type,
       cv.display_name, cv.display_name_alt, cv.starred, cv.custom_ringtone,
       cv.send_to_voicemail, cv.contact_last_updated_timestamp
FROM {p}data d
JOIN {p}raw_contacts r     ON r._id = d.raw_contact_id
JOIN {p}contacts_view cv   ON cv._id = r.contact_id;

-- A contact without raw contacts does not exist.
CREATE TRIGGER IF NOT EXISTS {p}raw_contacts_deleted
AFTER DELETE ON {p}raw_contacts
BEGIN
    DELETE FROM {p}contacts
     WHERE _id = OLD.contact_id
       AND NOT EXISTS (SELECT 1 FROM {p}raw_contacts WHERE contact_id = OLD.contact_id);
END;

CREATE TRIGGER IF NOT EXISTS {p}data_inserted
AFTER INSERT ON {p}data
BEGIN
    UPDATE {p}contacts SET contact_last_updated_timestamp = {now}
     WHERE _id = (SELECT contact_id FROM {p}raw_contacts WHERE _id = NEW.raw_contact_id);
END;

CREATE TRIGGER IF NOT EXISTS {p}data_updated
AFTER UPDATE ON {p}data
BEGIN
    UPDATE {p}contacts SET contact_last_updated_timestamp = {now}
     WHERE _id = (SELECT contact_id FROM {p}raw_contacts WHERE _id = NEW.raw_contact_id);
END;

CREATE TRIGGER IF NOT EXISTS {p}data_deleted
AFTER DELETE ON {p}data
BEGIN
    UPDATE {p}contacts SET contact_last_updated_timestamp = {now}
     WHERE _id = (SELECT contact_id FROM {p}raw_contacts WHERE _id = OLD.raw_contact_id);
END;
";

/// Every new raw contact gets a contact of its own; no aggregation.
const REGULAR: &str = "
CREATE TRIGGER IF NOT EXISTS raw_contacts_inserted
AFTER INSERT ON raw_contacts
WHEN NEW.contact_id IS NULL
BEGIN
    INSERT INTO contacts (contact_last_updated_timestamp) VALUES ({now});
    UPDATE raw_contacts SET contact_id = last_insert_rowid() WHERE _id = NEW._id;
    INSERT INTO data (raw_contact_id, mimetype, data1)
    SELECT NEW._id, 'vnd.android.cursor.item/group_membership', g._id
      FROM \"groups\" g
     WHERE g.auto_add = 1
       AND g.account_name IS NEW.account_name
       AND g.account_type IS NEW.account_type;
END;

-- Moving to another account joins that account's default group.
CREATE TRIGGER IF NOT EXISTS raw_contacts_account_changed
AFTER UPDATE OF account_name, account_type ON raw_contacts
BEGIN
    INSERT INTO data (raw_contact_id, mimetype, data1)
    SELECT NEW._id, 'vnd.android.cursor.item/group_membership', g._id
      FROM \"groups\" g
     WHERE g.auto_add = 1
       AND g.account_name IS NEW.account_name
       AND g.account_type IS NEW.account_type
       AND NOT EXISTS (
           SELECT 1 FROM data d
            WHERE d.raw_contact_id = NEW._id
              AND d.mimetype = 'vnd.android.cursor.item/group_membership'
              AND d.data1 = g._id);
END;
";

/// The profile has a single contact that every profile raw contact joins.
const PROFILE: &str = "
CREATE TRIGGER IF NOT EXISTS profile_raw_contacts_inserted
AFTER INSERT ON profile_raw_contacts
WHEN NEW.contact_id IS NULL
BEGIN
    INSERT INTO profile_contacts (contact_last_updated_timestamp)
    SELECT {now} WHERE NOT EXISTS (SELECT 1 FROM profile_contacts);
    UPDATE profile_raw_contacts
       SET contact_id = (SELECT MIN(_id) FROM profile_contacts)
     WHERE _id = NEW._id;
END;
";

const OTHER_TABLES: &str = "
CREATE TABLE IF NOT EXISTS \"groups\" (
    _id                INTEGER PRIMARY KEY AUTOINCREMENT,
    title              TEXT NOT NULL,
    group_is_read_only INTEGER NOT NULL DEFAULT 0,
    favorites          INTEGER NOT NULL DEFAULT 0,
    auto_add           INTEGER NOT NULL DEFAULT 0,
    account_name       TEXT,
    account_type       TEXT
);

CREATE TRIGGER IF NOT EXISTS groups_deleted
AFTER DELETE ON \"groups\"
BEGIN
    DELETE FROM data
     WHERE mimetype = 'vnd.android.cursor.item/group_membership' AND data1 = OLD._id;
    DELETE FROM profile_data
     WHERE mimetype = 'vnd.android.cursor.item/group_membership' AND data1 = OLD._id;
END;

CREATE TABLE IF NOT EXISTS blocked_numbers (
    _id             INTEGER PRIMARY KEY AUTOINCREMENT,
    original_number TEXT NOT NULL,
    e164_number     TEXT
);

CREATE TABLE IF NOT EXISTS sim_contacts (
    _id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name   TEXT,
    number TEXT
);
";

/// Epoch milliseconds.
const NOW: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` and the guarded
/// sequence seeding.
pub fn schema() -> String {
  let mut sql = String::from("PRAGMA foreign_keys = ON;\n");
  for prefix in ["", "profile_"] {
    sql.push_str(&CONTACT_TABLES.replace("{p}", prefix));
  }
  sql.push_str(OTHER_TABLES);
  sql.push_str(REGULAR);
  sql.push_str(PROFILE);
  for table in ["profile_contacts", "profile_raw_contacts", "profile_data"] {
    sql.push_str(&format!(
      "INSERT INTO sqlite_sequence (name, seq) SELECT '{table}', {seq} \
       WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = '{table}');\n",
      seq = PROFILE_MIN_ID - 1,
    ));
  }
  sql.push_str("PRAGMA user_version = 1;\n");
  sql.replace("{now}", NOW)
}
