//! The operations `apiexec.exec` can run, grouped by API area.

use befall_api::ops::{auth, guilds, instance, jobs, platform, users};
use befall_registry::{OperationRegistry, create_with_only_req, create_with_only_resp, create_with_req_and_resp};

pub fn build_operation_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();

    registry.register_category(
        "core",
        [
            create_with_only_resp("getApiConfig", instance::get_api_config),
            create_with_only_resp("getClustersHealth", instance::get_clusters_health),
            create_with_req_and_resp("getClusterModules", instance::get_cluster_modules),
        ],
    );

    registry.register_category(
        "auth",
        [
            create_with_req_and_resp("createIoAuthLogin", auth::create_ioauth_login),
            create_with_req_and_resp("testAuth", auth::test_auth),
            create_with_req_and_resp("createOauth2Login", auth::create_oauth2_login),
            create_with_only_resp("getUserSessions", auth::get_user_sessions),
            create_with_req_and_resp("createUserSession", auth::create_user_session),
            create_with_only_req("revokeUserSession", auth::revoke_user_session),
        ],
    );

    registry.register_category(
        "guilds",
        [
            create_with_req_and_resp("getStaffTeam", guilds::get_staff_team),
            create_with_req_and_resp("getModuleConfigurations", guilds::get_module_configurations),
            create_with_req_and_resp("patchModuleConfiguration", guilds::patch_module_configuration),
            create_with_req_and_resp("getAllCommandConfigurations", guilds::get_all_command_configurations),
            create_with_req_and_resp("patchCommandConfiguration", guilds::patch_command_configuration),
            create_with_req_and_resp("settingsExecute", guilds::settings_execute),
        ],
    );

    registry.register_category(
        "jobs",
        [
            create_with_req_and_resp("getGuildJob", jobs::get_guild_job),
            create_with_req_and_resp("getJobList", jobs::get_job_list),
            create_with_req_and_resp("createGuildJob", jobs::create_guild_job),
            create_with_req_and_resp("getIOAuthDownloadLink", jobs::get_ioauth_download_link),
        ],
    );

    registry.register_category(
        "user",
        [
            create_with_req_and_resp("getUser", users::get_user),
            create_with_req_and_resp("getUserGuilds", users::get_user_guilds),
            create_with_req_and_resp("getUserGuildBaseInfo", users::get_user_guild_base_info),
        ],
    );

    registry.register_category(
        "platform",
        [
            create_with_req_and_resp("getPlatformUser", platform::get_platform_user),
            create_with_only_req("clearPlatformUserCache", platform::clear_platform_user_cache),
        ],
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use befall_registry::OperationKind;

    #[test]
    fn every_category_is_registered_in_order() {
        let registry = build_operation_registry();
        let names: Vec<_> = registry.list_categories().into_iter().map(|category| category.name).collect();
        assert_eq!(names, vec!["core", "auth", "guilds", "jobs", "user", "platform"]);
        assert_eq!(registry.len(), 24);
    }

    #[test]
    fn kinds_follow_the_handler_signatures() {
        let registry = build_operation_registry();
        let kind = |id: &str| registry.lookup(id).map(|operation| operation.kind());
        assert_eq!(kind("getApiConfig"), Some(OperationKind::ResponseOnly));
        assert_eq!(kind("revokeUserSession"), Some(OperationKind::RequestOnly));
        assert_eq!(kind("getUserGuilds"), Some(OperationKind::RequestAndResponse));
    }

    #[test]
    fn request_shapes_expose_their_source_keys() {
        let registry = build_operation_registry();
        let shape = registry
            .lookup("getUserGuilds")
            .and_then(|operation| operation.request_shape())
            .expect("getUserGuilds takes a request");
        let keys: Vec<_> = shape.bindable_fields().filter_map(|field| field.source_key).collect();
        assert_eq!(keys, vec!["refresh"]);
    }
}
