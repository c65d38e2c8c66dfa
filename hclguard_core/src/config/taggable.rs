//! Built-in taggable resource allowlist

use std::collections::BTreeMap;

const AWS: &[&str] = &[
    "aws_instance",
    "aws_launch_template",
    "aws_ami",
    "aws_ami_copy",
    "aws_ami_from_instance",
    "aws_ec2_capacity_reservation",
    "aws_ec2_fleet",
    "aws_spot_fleet_request",
    "aws_spot_instance_request",
    "aws_ebs_volume",
    "aws_ebs_snapshot",
    "aws_s3_bucket",
    "aws_s3_bucket_object",
    "aws_s3_object",
    "aws_efs_file_system",
    "aws_fsx_backup",
    "aws_fsx_lustre_file_system",
    "aws_fsx_ontap_file_system",
    "aws_fsx_openzfs_file_system",
    "aws_fsx_windows_file_system",
    "aws_vpc",
    "aws_subnet",
    "aws_internet_gateway",
    "aws_nat_gateway",
    "aws_route_table",
    "aws_security_group",
    "aws_network_interface",
    "aws_eip",
    "aws_vpc_endpoint",
    "aws_vpc_peering_connection",
    "aws_customer_gateway",
    "aws_vpn_gateway",
    "aws_vpn_connection",
    "aws_network_acl",
    "aws_egress_only_internet_gateway",
    "aws_lb",
    "aws_alb",
    "aws_lb_target_group",
    "aws_alb_target_group",
    "aws_db_instance",
    "aws_db_cluster",
    "aws_db_snapshot",
    "aws_db_cluster_snapshot",
    "aws_rds_cluster",
    "aws_rds_cluster_instance",
    "aws_elasticache_cluster",
    "aws_elasticache_replication_group",
    "aws_dynamodb_table",
    "aws_neptune_cluster",
    "aws_neptune_cluster_instance",
    "aws_docdb_cluster",
    "aws_docdb_cluster_instance",
    "aws_ecs_cluster",
    "aws_ecs_service",
    "aws_ecs_task_definition",
    "aws_eks_cluster",
    "aws_eks_node_group",
    "aws_ecr_repository",
    "aws_lambda_function",
    "aws_lambda_layer_version",
    "aws_iam_role",
    "aws_iam_user",
    "aws_iam_policy",
    "aws_iam_instance_profile",
    "aws_iam_openid_connect_provider",
    "aws_iam_saml_provider",
    "aws_cloudwatch_log_group",
    "aws_cloudwatch_metric_alarm",
    "aws_cloudwatch_dashboard",
    "aws_sns_topic",
    "aws_sqs_queue",
    "aws_kms_key",
    "aws_kms_alias",
    "aws_secretsmanager_secret",
    "aws_acm_certificate",
    "aws_wafv2_web_acl",
    "aws_wafv2_ip_set",
    "aws_wafv2_regex_pattern_set",
    "aws_api_gateway_rest_api",
    "aws_apigatewayv2_api",
    "aws_cloudfront_distribution",
    "aws_route53_zone",
    "aws_route53_health_check",
    "aws_kinesis_stream",
    "aws_kinesis_firehose_delivery_stream",
    "aws_elasticsearch_domain",
    "aws_opensearch_domain",
    "aws_glue_job",
    "aws_glue_crawler",
    "aws_sagemaker_notebook_instance",
    "aws_sagemaker_model",
    "aws_backup_plan",
    "aws_backup_vault",
];

const AZURERM: &[&str] = &[
    "azurerm_virtual_machine",
    "azurerm_linux_virtual_machine",
    "azurerm_windows_virtual_machine",
    "azurerm_virtual_machine_scale_set",
    "azurerm_linux_virtual_machine_scale_set",
    "azurerm_windows_virtual_machine_scale_set",
    "azurerm_image",
    "azurerm_snapshot",
    "azurerm_storage_account",
    "azurerm_storage_container",
    "azurerm_storage_blob",
    "azurerm_managed_disk",
    "azurerm_virtual_network",
    "azurerm_subnet",
    "azurerm_network_interface",
    "azurerm_network_security_group",
    "azurerm_public_ip",
    "azurerm_lb",
    "azurerm_application_gateway",
    "azurerm_vpn_gateway",
    "azurerm_virtual_network_gateway",
    "azurerm_express_route_circuit",
    "azurerm_sql_server",
    "azurerm_sql_database",
    "azurerm_postgresql_server",
    "azurerm_postgresql_flexible_server",
    "azurerm_mysql_server",
    "azurerm_mysql_flexible_server",
    "azurerm_mariadb_server",
    "azurerm_cosmosdb_account",
    "azurerm_redis_cache",
    "azurerm_kubernetes_cluster",
    "azurerm_container_registry",
    "azurerm_container_group",
    "azurerm_app_service",
    "azurerm_linux_web_app",
    "azurerm_windows_web_app",
    "azurerm_function_app",
    "azurerm_linux_function_app",
    "azurerm_windows_function_app",
    "azurerm_resource_group",
    "azurerm_log_analytics_workspace",
    "azurerm_application_insights",
    "azurerm_key_vault",
    "azurerm_key_vault_key",
    "azurerm_key_vault_secret",
];

const GOOGLE: &[&str] = &[
    "google_compute_instance",
    "google_compute_disk",
    "google_compute_image",
    "google_compute_snapshot",
    "google_compute_instance_template",
    "google_compute_instance_group",
    "google_compute_instance_group_manager",
    "google_compute_network",
    "google_compute_subnetwork",
    "google_compute_address",
    "google_compute_global_address",
    "google_compute_firewall",
    "google_compute_router",
    "google_compute_vpn_gateway",
    "google_compute_forwarding_rule",
    "google_compute_global_forwarding_rule",
    "google_compute_backend_service",
    "google_compute_health_check",
    "google_storage_bucket",
    "google_storage_bucket_object",
    "google_filestore_instance",
    "google_sql_database_instance",
    "google_bigtable_instance",
    "google_spanner_instance",
    "google_firestore_database",
    "google_container_cluster",
    "google_container_node_pool",
    "google_artifact_registry_repository",
    "google_cloudfunctions_function",
    "google_cloud_run_service",
    "google_logging_log_sink",
    "google_monitoring_alert_policy",
    "google_kms_key_ring",
    "google_kms_crypto_key",
    "google_secret_manager_secret",
    "google_pubsub_topic",
    "google_pubsub_subscription",
];

const OCI: &[&str] = &[
    "oci_core_instance",
    "oci_core_boot_volume",
    "oci_core_volume",
    "oci_core_image",
    "oci_core_vcn",
    "oci_core_subnet",
    "oci_core_security_list",
    "oci_core_network_security_group",
    "oci_core_internet_gateway",
    "oci_core_nat_gateway",
    "oci_core_service_gateway",
    "oci_core_local_peering_gateway",
    "oci_core_drg",
    "oci_objectstorage_bucket",
    "oci_file_storage_file_system",
    "oci_database_db_system",
    "oci_database_autonomous_database",
    "oci_containerengine_cluster",
    "oci_containerengine_node_pool",
];

/// Resource types known to accept a tag (or label) map, keyed by provider.
pub fn default_taggable_resources() -> BTreeMap<String, Vec<String>> {
    [("aws", AWS), ("azurerm", AZURERM), ("google", GOOGLE), ("oci", OCI)]
        .into_iter()
        .map(|(provider, types)| {
            (
                provider.to_string(),
                types.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}
