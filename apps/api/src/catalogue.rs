//! Permission and inheritance declarations of the document management apps.

use custodia_application::access_control_catalogue::{
    acl_edit, acl_view, register_access_control_permissions,
};
use custodia_application::{ModelPermissionRegistry, ModelPermissionRegistryBuilder};
use custodia_core::AppResult;
use custodia_domain::{ModelType, PermissionId};

/// Builds the registry every service shares.
pub fn build_registry() -> AppResult<ModelPermissionRegistry> {
    let mut builder = ModelPermissionRegistry::builder();
    register_access_control_permissions(&mut builder)?;
    register_documents(&mut builder)?;
    register_cabinets(&mut builder)?;
    register_workflows(&mut builder)?;
    register_indexing(&mut builder)?;
    register_tags(&mut builder)?;
    register_metadata(&mut builder)?;

    Ok(builder.build())
}

fn model(app_label: &str, name: &str) -> AppResult<ModelType> {
    ModelType::new(app_label, name)
}

/// Registers `permissions` plus the entry administration pair on `model`.
fn register_controlled(
    builder: &mut ModelPermissionRegistryBuilder,
    model: &ModelType,
    permissions: &[PermissionId],
) -> AppResult<()> {
    let mut all = permissions.to_vec();
    all.extend([acl_edit()?, acl_view()?]);
    builder.register(model, &all)?;
    Ok(())
}

fn register_documents(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("documents", "Documents")?;
    let document_view = builder.register_permission(&namespace, "document_view", "View documents")?;
    let document_edit = builder.register_permission(&namespace, "document_edit", "Edit documents")?;
    let document_delete =
        builder.register_permission(&namespace, "document_delete", "Delete documents")?;
    let document_download =
        builder.register_permission(&namespace, "document_download", "Download documents")?;
    let document_create =
        builder.register_permission(&namespace, "document_create", "Create documents")?;
    let document_type_view =
        builder.register_permission(&namespace, "document_type_view", "View document types")?;
    let document_type_edit =
        builder.register_permission(&namespace, "document_type_edit", "Edit document types")?;
    let document_type_delete = builder.register_permission(
        &namespace,
        "document_type_delete",
        "Delete document types",
    )?;

    let document_type = model("documents", "documenttype")?;
    register_controlled(
        builder,
        &document_type,
        &[
            document_create,
            document_type_delete,
            document_type_edit,
            document_type_view,
            document_view.clone(),
            document_edit.clone(),
            document_delete.clone(),
            document_download.clone(),
        ],
    )?;

    let document = model("documents", "document")?;
    register_controlled(
        builder,
        &document,
        &[
            document_view.clone(),
            document_edit.clone(),
            document_delete,
            document_download.clone(),
        ],
    )?;
    builder.register_inheritance(&document, "document_type")?;

    let document_file = model("documents", "documentfile")?;
    register_controlled(
        builder,
        &document_file,
        &[document_view.clone(), document_edit.clone(), document_download],
    )?;
    builder.register_inheritance(&document_file, "document")?;

    let document_version = model("documents", "documentversion")?;
    register_controlled(
        builder,
        &document_version,
        &[document_view.clone(), document_edit],
    )?;
    builder.register_inheritance(&document_version, "document")?;

    let document_version_page = model("documents", "documentversionpage")?;
    register_controlled(builder, &document_version_page, &[document_view])?;
    builder.register_inheritance(&document_version_page, "document_version")?;

    builder.register_proxy(&model("documents", "trasheddocument")?, &document)?;
    builder.register_proxy(&model("documents", "recentlyaccesseddocument")?, &document)?;

    Ok(())
}

fn register_cabinets(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("cabinets", "Cabinets")?;
    let cabinet_view = builder.register_permission(&namespace, "cabinet_view", "View cabinets")?;
    let cabinet_edit = builder.register_permission(&namespace, "cabinet_edit", "Edit cabinets")?;
    let cabinet_delete =
        builder.register_permission(&namespace, "cabinet_delete", "Delete cabinets")?;
    let cabinet_add_document = builder.register_permission(
        &namespace,
        "cabinet_add_document",
        "Add documents to cabinets",
    )?;
    let cabinet_remove_document = builder.register_permission(
        &namespace,
        "cabinet_remove_document",
        "Remove documents from cabinets",
    )?;

    let cabinet = model("cabinets", "cabinet")?;
    register_controlled(
        builder,
        &cabinet,
        &[
            cabinet_view,
            cabinet_edit,
            cabinet_delete,
            cabinet_add_document.clone(),
            cabinet_remove_document.clone(),
        ],
    )?;
    builder.register_inheritance(&cabinet, "parent")?;

    builder.register(
        &model("documents", "document")?,
        &[cabinet_add_document, cabinet_remove_document],
    )?;

    Ok(())
}

fn register_workflows(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("document_states", "Workflows")?;
    let workflow_view = builder.register_permission(&namespace, "workflow_view", "View workflows")?;
    let workflow_edit = builder.register_permission(&namespace, "workflow_edit", "Edit workflows")?;
    let workflow_delete =
        builder.register_permission(&namespace, "workflow_delete", "Delete workflows")?;
    let workflow_transition = builder.register_permission(
        &namespace,
        "workflow_transition",
        "Transition workflows",
    )?;

    let workflow = model("document_states", "workflow")?;
    register_controlled(
        builder,
        &workflow,
        &[
            workflow_view.clone(),
            workflow_edit.clone(),
            workflow_delete,
            workflow_transition.clone(),
        ],
    )?;

    let workflow_state = model("document_states", "workflowstate")?;
    register_controlled(builder, &workflow_state, &[workflow_view.clone(), workflow_edit])?;
    builder.register_inheritance(&workflow_state, "workflow")?;

    let workflow_transition_model = model("document_states", "workflowtransition")?;
    register_controlled(
        builder,
        &workflow_transition_model,
        &[workflow_transition.clone()],
    )?;
    builder.register_inheritance(&workflow_transition_model, "workflow")?;

    let workflow_instance = model("document_states", "workflowinstance")?;
    register_controlled(
        builder,
        &workflow_instance,
        &[workflow_view, workflow_transition],
    )?;
    builder.register_inheritance(&workflow_instance, "workflow")?;
    builder.register_inheritance(&workflow_instance, "document")?;

    Ok(())
}

fn register_indexing(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("document_indexing", "Indexing")?;
    let index_view = builder.register_permission(&namespace, "index_view", "View indexes")?;
    let index_edit = builder.register_permission(&namespace, "index_edit", "Edit indexes")?;
    let index_delete = builder.register_permission(&namespace, "index_delete", "Delete indexes")?;
    let index_rebuild =
        builder.register_permission(&namespace, "index_rebuild", "Rebuild indexes")?;

    let index_template = model("document_indexing", "indextemplate")?;
    register_controlled(
        builder,
        &index_template,
        &[index_view.clone(), index_edit, index_delete, index_rebuild],
    )?;

    let index_template_node = model("document_indexing", "indextemplatenode")?;
    register_controlled(builder, &index_template_node, &[index_view.clone()])?;
    builder.register_inheritance(&index_template_node, "index")?;

    let index_instance_node = model("document_indexing", "indexinstancenode")?;
    register_controlled(builder, &index_instance_node, &[index_view])?;
    builder.register_inheritance(&index_instance_node, "index_template_node.index")?;

    Ok(())
}

fn register_tags(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("tags", "Tags")?;
    let tag_view = builder.register_permission(&namespace, "tag_view", "View tags")?;
    let tag_edit = builder.register_permission(&namespace, "tag_edit", "Edit tags")?;
    let tag_delete = builder.register_permission(&namespace, "tag_delete", "Delete tags")?;
    let tag_attach = builder.register_permission(&namespace, "tag_attach", "Attach tags")?;
    let tag_remove = builder.register_permission(&namespace, "tag_remove", "Remove tags")?;

    register_controlled(
        builder,
        &model("tags", "tag")?,
        &[
            tag_view,
            tag_edit,
            tag_delete,
            tag_attach.clone(),
            tag_remove.clone(),
        ],
    )?;
    builder.register(&model("documents", "document")?, &[tag_attach, tag_remove])?;

    Ok(())
}

fn register_metadata(builder: &mut ModelPermissionRegistryBuilder) -> AppResult<()> {
    let namespace = builder.register_namespace("metadata", "Metadata")?;
    let metadata_type_view =
        builder.register_permission(&namespace, "metadata_type_view", "View metadata types")?;
    let metadata_type_edit =
        builder.register_permission(&namespace, "metadata_type_edit", "Edit metadata types")?;
    let metadata_type_delete = builder.register_permission(
        &namespace,
        "metadata_type_delete",
        "Delete metadata types",
    )?;
    let metadata_document_view = builder.register_permission(
        &namespace,
        "metadata_document_view",
        "View metadata",
    )?;
    let metadata_document_edit = builder.register_permission(
        &namespace,
        "metadata_document_edit",
        "Edit metadata",
    )?;

    register_controlled(
        builder,
        &model("metadata", "metadatatype")?,
        &[
            metadata_type_view,
            metadata_type_edit,
            metadata_type_delete,
            metadata_document_view.clone(),
            metadata_document_edit.clone(),
        ],
    )?;

    let document_metadata = model("metadata", "documentmetadata")?;
    register_controlled(
        builder,
        &document_metadata,
        &[metadata_document_view.clone(), metadata_document_edit.clone()],
    )?;
    builder.register_inheritance(&document_metadata, "document")?;
    builder.register_inheritance(&document_metadata, "metadata_type")?;

    builder.register(
        &model("documents", "document")?,
        &[metadata_document_view, metadata_document_edit],
    )?;

    Ok(())
}
