//! Human-readable rendering of structured API errors.

use befall_types::models::{CanonicalSettingsError, PermissionCheck, PermissionResult};

/// Discord permission bits by position.
const DISCORD_PERMISSIONS: &[(u32, &str)] = &[
    (0, "CREATE_INSTANT_INVITE"),
    (1, "KICK_MEMBERS"),
    (2, "BAN_MEMBERS"),
    (3, "ADMINISTRATOR"),
    (4, "MANAGE_CHANNELS"),
    (5, "MANAGE_GUILD"),
    (6, "ADD_REACTIONS"),
    (7, "VIEW_AUDIT_LOG"),
    (8, "PRIORITY_SPEAKER"),
    (9, "STREAM"),
    (10, "VIEW_CHANNEL"),
    (11, "SEND_MESSAGES"),
    (12, "SEND_TTS_MESSAGES"),
    (13, "MANAGE_MESSAGES"),
    (14, "EMBED_LINKS"),
    (15, "ATTACH_FILES"),
    (16, "READ_MESSAGE_HISTORY"),
    (17, "MENTION_EVERYONE"),
    (18, "USE_EXTERNAL_EMOJIS"),
    (19, "VIEW_GUILD_INSIGHTS"),
    (20, "CONNECT"),
    (21, "SPEAK"),
    (22, "MUTE_MEMBERS"),
    (23, "DEAFEN_MEMBERS"),
    (24, "MOVE_MEMBERS"),
    (25, "USE_VAD"),
    (26, "CHANGE_NICKNAME"),
    (27, "MANAGE_NICKNAMES"),
    (28, "MANAGE_ROLES"),
    (29, "MANAGE_WEBHOOKS"),
    (30, "MANAGE_GUILD_EXPRESSIONS"),
    (31, "USE_APPLICATION_COMMANDS"),
    (32, "REQUEST_TO_SPEAK"),
    (33, "MANAGE_EVENTS"),
    (34, "MANAGE_THREADS"),
    (35, "CREATE_PUBLIC_THREADS"),
    (36, "CREATE_PRIVATE_THREADS"),
    (37, "USE_EXTERNAL_STICKERS"),
    (38, "SEND_MESSAGES_IN_THREADS"),
    (39, "USE_EMBEDDED_ACTIVITIES"),
    (40, "MODERATE_MEMBERS"),
    (41, "VIEW_CREATOR_MONETIZATION_ANALYTICS"),
    (42, "USE_SOUNDBOARD"),
    (43, "CREATE_GUILD_EXPRESSIONS"),
    (44, "CREATE_EVENTS"),
    (45, "USE_EXTERNAL_SOUNDS"),
    (46, "SEND_VOICE_MESSAGES"),
];

/// Names of the permission bits set in a decimal bitset string.
pub fn discord_permission_names(bits: &str) -> Vec<&'static str> {
    let Ok(bits) = bits.trim().parse::<u64>() else {
        return Vec::new();
    };
    DISCORD_PERMISSIONS
        .iter()
        .filter(|(position, _)| bits & (1u64 << position) != 0)
        .map(|(_, name)| *name)
        .collect()
}

fn joiner(and: bool) -> &'static str {
    if and { " AND " } else { " OR " }
}

pub fn format_permission_check(check: &PermissionCheck) -> String {
    let mut out = String::new();

    if !check.native_perms.is_empty() {
        let perms: Vec<String> = check
            .native_perms
            .iter()
            .map(|perm| format!("{:?} ({perm})", discord_permission_names(perm)))
            .collect();
        out.push_str("\t- Discord: ");
        out.push_str(&perms.join(joiner(check.inner_and)));
    }

    if !check.kittycat_perms.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("\t- Custom Permissions (kittycat): ");
        out.push_str(&check.kittycat_perms.join(joiner(check.inner_and)));
    }

    out
}

pub fn format_permission_result(result: &PermissionResult) -> String {
    match result {
        PermissionResult::Ok => "No message/context available".to_string(),
        PermissionResult::OkWithMessage { message } => message.clone(),
        PermissionResult::MissingKittycatPerms { check }
        | PermissionResult::MissingNativePerms { check }
        | PermissionResult::MissingAnyPerms { check } => format!(
            "You do not have the required permissions to perform this action. Try checking that you have the below permissions: {}",
            format_permission_check(check)
        ),
        PermissionResult::CommandDisabled { command_config } => format!(
            "You cannot perform this action because the command ``{}`` is disabled on this server",
            command_config.command
        ),
        PermissionResult::UnknownModule { module_config } => {
            format!("The module ``{}`` does not exist", module_config.module)
        }
        PermissionResult::ModuleNotFound => "The module corresponding to this command could not be determined!".to_string(),
        PermissionResult::ModuleDisabled { module_config } => {
            format!("The module ``{}`` is disabled on this server", module_config.module)
        }
        PermissionResult::NoChecksSucceeded { check } => format!(
            "You do not have the required permissions to perform this action. You need at least one of the following permissions to execute this command:\n\n**Required Permissions**:\n\n{}",
            format_permission_check(check)
        ),
        PermissionResult::DiscordError { error } => format!(
            "A Discord-related error seems to have occurred: {error}.\n\nPlease try again later, it might work!"
        ),
        PermissionResult::SudoNotGranted => {
            "This module is only available for root (staff) and/or developers of the bot".to_string()
        }
        PermissionResult::GenericError { error } => error.clone(),
    }
}

pub fn format_settings_error(error: &CanonicalSettingsError) -> String {
    match error {
        CanonicalSettingsError::Generic { message, src, typ } => {
            format!("An error occurred: `{message}` from src `{src}` of type `{typ}`")
        }
        CanonicalSettingsError::OperationNotSupported { operation } => {
            format!("Operation `{operation}` is not supported")
        }
        CanonicalSettingsError::SchemaTypeValidationError {
            column,
            expected_type,
            got_type,
        } => format!("Column `{column}` expected type `{expected_type}`, got type `{got_type}`"),
        CanonicalSettingsError::SchemaNullValueValidationError { column } => {
            format!("Column `{column}` is not nullable, yet value is null")
        }
        CanonicalSettingsError::SchemaCheckValidationError {
            column,
            check,
            accepted_range,
            error,
        } => format!("Column `{column}` failed check `{check}`, accepted range: `{accepted_range}`, error: `{error}`"),
        CanonicalSettingsError::MissingOrInvalidField { field, src } => {
            format!("Missing (or invalid) field `{field}` with src: `{src}`")
        }
        CanonicalSettingsError::RowExists { column_id, count } => {
            format!("A row with the same column `{column_id}` already exists. Count: `{count}`")
        }
        CanonicalSettingsError::RowDoesNotExist { column_id } => {
            format!("A row with the same column `{column_id}` does not exist")
        }
        CanonicalSettingsError::MaximumCountReached { max, current } => format!(
            "The maximum number of entities this server may have (`{max}`) has been reached. This server currently has `{current}`."
        ),
    }
}

/// Stable code naming the settings error variant.
pub fn settings_error_code(error: &CanonicalSettingsError) -> &'static str {
    match error {
        CanonicalSettingsError::Generic { .. } => "Generic",
        CanonicalSettingsError::OperationNotSupported { .. } => "OperationNotSupported",
        CanonicalSettingsError::SchemaTypeValidationError { .. } => "SchemaTypeValidationError",
        CanonicalSettingsError::SchemaNullValueValidationError { .. } => "SchemaNullValueValidationError",
        CanonicalSettingsError::SchemaCheckValidationError { .. } => "SchemaCheckValidationError",
        CanonicalSettingsError::MissingOrInvalidField { .. } => "MissingOrInvalidField",
        CanonicalSettingsError::RowExists { .. } => "RowExists",
        CanonicalSettingsError::RowDoesNotExist { .. } => "RowDoesNotExist",
        CanonicalSettingsError::MaximumCountReached { .. } => "MaximumCountReached",
    }
}
