//! End to end engine behaviour over an in-memory vault.

use super::helpers::{engine_with_clock, project_vault, vault_from};
use crate::{
    block::INVALID_PLACEMENT_NOTICE,
    config::WaypointSettings,
    engine::MarkerOutcome,
    event::StoreEvent,
    folder_note::FolderNoteType,
    sort::SortType,
    vault::{Node, NodeKind},
};
use std::time::Duration;
use test_log::test;

const PROJECTS_BLOCK: &str = "%% Begin Waypoint %%\n- **[[Alpha]]**\n\t- [[Plan]]\n- **Beta**\n\t- [[Spec]]\n- [[Ideas]]\n%% End Waypoint %%";

fn projects_note(block: &str) -> String {
    format!("# Projects\n\n{block}\n\nfooter\n")
}

#[test(tokio::test)]
async fn marker_becomes_listing_and_stays_put() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    let doc = Node::document("Projects/Projects.md");

    let outcome = engine.detect_marker(&doc).await.unwrap();
    assert_eq!(outcome, MarkerOutcome::FolderNote);
    assert_eq!(
        engine.vault().content("Projects/Projects.md").unwrap(),
        projects_note(PROJECTS_BLOCK)
    );

    let writes = engine.vault().writes();
    assert_eq!(engine.sync_all().await.unwrap(), 0);
    assert_eq!(engine.vault().writes(), writes);
}

#[test(tokio::test)]
async fn created_document_appears_in_listing() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    let node = engine.vault().insert_document("Projects/Beta/Notes.md", "");
    engine.on_store_event(StoreEvent::Created(node)).await.unwrap();

    let content = engine.vault().content("Projects/Projects.md").unwrap();
    assert!(content.contains("- **Beta**\n\t- [[Notes]]\n\t- [[Spec]]\n"));
}

#[test(tokio::test)]
async fn rename_updates_both_folders_once() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();
    let renders = engine.stats().renders;

    let node = engine
        .vault()
        .rename("Projects/Ideas.md", "Projects/Beta/Ideas.md")
        .unwrap();
    engine
        .on_store_event(StoreEvent::Renamed {
            node,
            old_path: "Projects/Ideas.md".to_string(),
        })
        .await
        .unwrap();

    // Both touched folders resolve to the same note
    assert_eq!(engine.stats().renders, renders + 1);
    assert_eq!(
        engine.vault().content("Projects/Projects.md").unwrap(),
        projects_note(
            "%% Begin Waypoint %%\n- **[[Alpha]]**\n\t- [[Plan]]\n- **Beta**\n\t- [[Ideas]]\n\t- [[Spec]]\n%% End Waypoint %%"
        )
    );
}

#[test(tokio::test)]
async fn deleted_folder_leaves_listing() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    assert_eq!(engine.vault().remove("Projects/Alpha"), Some(NodeKind::Folder));
    engine
        .on_store_event(StoreEvent::Deleted {
            path: "Projects/Alpha".to_string(),
            kind: NodeKind::Folder,
        })
        .await
        .unwrap();

    assert_eq!(
        engine.vault().content("Projects/Projects.md").unwrap(),
        projects_note("%% Begin Waypoint %%\n- **Beta**\n\t- [[Spec]]\n- [[Ideas]]\n%% End Waypoint %%")
    );
}

#[test(tokio::test)]
async fn nested_waypoint_collapses_in_parent() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    let alpha = engine
        .vault()
        .insert_document("Projects/Alpha/Alpha.md", "# Alpha\n%% Waypoint %%\n");
    let outcome = engine.detect_marker(&alpha).await.unwrap();
    assert_eq!(outcome, MarkerOutcome::FolderNote);

    assert_eq!(
        engine.vault().content("Projects/Alpha/Alpha.md").unwrap(),
        "# Alpha\n%% Begin Waypoint %%\n- [[Plan]]\n%% End Waypoint %%\n"
    );
    assert_eq!(
        engine.vault().content("Projects/Projects.md").unwrap(),
        projects_note(
            "%% Begin Waypoint %%\n- **[[Alpha]]**\n- **Beta**\n\t- [[Spec]]\n- [[Ideas]]\n%% End Waypoint %%"
        )
    );
}

#[test(tokio::test)]
async fn stop_at_folder_notes_lists_headers_only() {
    let settings = WaypointSettings {
        stop_scan_at_folder_notes: true,
        ..WaypointSettings::default()
    };
    let (engine, _clock) = engine_with_clock(project_vault(), settings);
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    // Beta has no folder note, so it is still expanded
    assert_eq!(
        engine.vault().content("Projects/Projects.md").unwrap(),
        projects_note(
            "%% Begin Waypoint %%\n- **[[Alpha]]**\n- **Beta**\n\t- [[Spec]]\n- [[Ideas]]\n%% End Waypoint %%"
        )
    );
}

fn sorting_vault() -> crate::vault::MemoryVault {
    vault_from(&[
        ("L/L.md", "%% Waypoint %%"),
        ("L/item 10.md", ""),
        ("L/item 2.md", ""),
        ("L/banana.md", ""),
        ("L/Apple.md", ""),
        ("L/Zoo/", ""),
    ])
}

async fn sorted_listing(sort: SortType) -> String {
    let settings = WaypointSettings {
        sort_type: sort,
        ..WaypointSettings::default()
    };
    let (engine, _clock) = engine_with_clock(sorting_vault(), settings);
    engine.detect_marker(&Node::document("L/L.md")).await.unwrap();
    engine.vault().content("L/L.md").unwrap()
}

#[test(tokio::test)]
async fn sort_orders() {
    assert_eq!(
        sorted_listing(SortType::Natural).await,
        "%% Begin Waypoint %%\n- [[Apple]]\n- [[banana]]\n- [[item 2]]\n- [[item 10]]\n- **Zoo**\n%% End Waypoint %%"
    );
    assert_eq!(
        sorted_listing(SortType::Lexicographic).await,
        "%% Begin Waypoint %%\n- [[Apple]]\n- **Zoo**\n- [[banana]]\n- [[item 10]]\n- [[item 2]]\n%% End Waypoint %%"
    );
    assert_eq!(
        sorted_listing(SortType::FoldersFirst).await,
        "%% Begin Waypoint %%\n- **Zoo**\n- [[Apple]]\n- [[banana]]\n- [[item 2]]\n- [[item 10]]\n%% End Waypoint %%"
    );
}

#[test(tokio::test)]
async fn root_marker_lists_the_vault() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    let home = engine
        .vault()
        .insert_document("Home.md", "# Home\n%% Waypoint %%\n");
    let outcome = engine.detect_marker(&home).await.unwrap();

    assert_eq!(outcome, MarkerOutcome::RootNote);
    assert_eq!(engine.settings().root.as_deref(), Some("Home.md"));
    assert_eq!(
        engine.vault().content("Home.md").unwrap(),
        "# Home\n%% Begin Waypoint %%\n- **[[Home]]**\n\t- **[[Projects]]**\n%% End Waypoint %%\n"
    );

    // A new top level document is picked up by the root note
    let node = engine.vault().insert_document("Inbox.md", "");
    engine.on_store_event(StoreEvent::Created(node)).await.unwrap();
    assert!(engine
        .vault()
        .content("Home.md")
        .unwrap()
        .contains("\t- [[Inbox]]\n\t- **[[Projects]]**\n"));
}

#[test(tokio::test)]
async fn marker_in_plain_note_is_replaced_by_notice() {
    let vault = project_vault();
    vault.insert_document("Projects/Alpha/Plan.md", "draft\n%% Waypoint %%\nmore");
    let (engine, _clock) = engine_with_clock(vault, WaypointSettings::default());

    let outcome = engine
        .detect_marker(&Node::document("Projects/Alpha/Plan.md"))
        .await
        .unwrap();

    assert_eq!(outcome, MarkerOutcome::Rejected);
    assert_eq!(
        engine.vault().content("Projects/Alpha/Plan.md").unwrap(),
        format!("draft\n{INVALID_PLACEMENT_NOTICE}\nmore")
    );
}

#[test(tokio::test)]
async fn outside_folder_notes_sit_next_to_their_folder() {
    let vault = vault_from(&[
        ("Topics.md", "%% Waypoint %%"),
        ("Topics/one.md", ""),
        ("Topics/Sub.md", ""),
        ("Topics/Sub/two.md", ""),
    ]);
    let settings = WaypointSettings {
        folder_note_type: FolderNoteType::OutsideFolder,
        ..WaypointSettings::default()
    };
    let (engine, _clock) = engine_with_clock(vault, settings);

    let outcome = engine
        .detect_marker(&Node::document("Topics.md"))
        .await
        .unwrap();

    assert_eq!(outcome, MarkerOutcome::FolderNote);
    assert_eq!(engine.settings().root, None);
    assert_eq!(
        engine.vault().content("Topics.md").unwrap(),
        "%% Begin Waypoint %%\n- [[one]]\n- **[[Sub]]**\n\t- [[two]]\n%% End Waypoint %%"
    );
}

#[test(tokio::test)]
async fn burst_settles_into_final_listing() {
    let settings = WaypointSettings {
        debounce_ms: 300,
        ..WaypointSettings::default()
    };
    let (engine, clock) = engine_with_clock(project_vault(), settings);
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();
    let renders = engine.stats().renders;

    for name in ["a", "b", "c"] {
        let node = engine
            .vault()
            .insert_document(&format!("Projects/Beta/{name}.md"), "");
        engine.on_store_event(StoreEvent::Created(node)).await.unwrap();
        clock.advance(Duration::from_millis(50));
    }
    // Leading edge ran, the rest is waiting
    assert_eq!(engine.stats().renders, renders + 1);
    assert_eq!(engine.pending(), 1);
    assert_eq!(engine.flush_idle().await, 0);

    clock.advance(Duration::from_millis(300));
    assert_eq!(engine.flush_idle().await, 1);
    assert_eq!(engine.stats().renders, renders + 2);
    assert!(engine
        .vault()
        .content("Projects/Projects.md")
        .unwrap()
        .contains("- **Beta**\n\t- [[a]]\n\t- [[b]]\n\t- [[c]]\n\t- [[Spec]]\n"));
}

#[test(tokio::test)]
async fn ignored_folder_changes_are_invisible() {
    let settings = WaypointSettings {
        ignore_paths: vec!["Projects/Beta".to_string()],
        ..WaypointSettings::default()
    };
    let (engine, _clock) = engine_with_clock(project_vault(), settings);
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    let content = engine.vault().content("Projects/Projects.md").unwrap();
    assert!(!content.contains("Beta"));
    assert!(!content.contains("Spec"));
}

#[test(tokio::test)]
async fn new_folder_note_relinks_its_header() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();

    let note = engine.vault().insert_document("Projects/Beta/Beta.md", "# Beta\n");
    engine.on_store_event(StoreEvent::Created(note)).await.unwrap();

    assert!(engine
        .vault()
        .content("Projects/Projects.md")
        .unwrap()
        .contains("- **[[Beta]]**\n\t- [[Spec]]\n"));
}

#[test(tokio::test)]
async fn marker_in_inside_note_collapses_enclosing_listing() {
    let vault = vault_from(&[
        ("X/X.md", "%% Waypoint %%"),
        ("X/Sub/Sub.md", "# Sub\n"),
        ("X/Sub/item.md", ""),
    ]);
    let (engine, _clock) = engine_with_clock(vault, WaypointSettings::default());
    engine.detect_marker(&Node::document("X/X.md")).await.unwrap();
    assert_eq!(
        engine.vault().content("X/X.md").unwrap(),
        "%% Begin Waypoint %%\n- **[[Sub]]**\n\t- [[item]]\n%% End Waypoint %%"
    );

    let sub = engine
        .vault()
        .insert_document("X/Sub/Sub.md", "# Sub\n%% Waypoint %%\n");
    assert_eq!(
        engine.detect_marker(&sub).await.unwrap(),
        MarkerOutcome::FolderNote
    );

    assert_eq!(
        engine.vault().content("X/Sub/Sub.md").unwrap(),
        "# Sub\n%% Begin Waypoint %%\n- [[item]]\n%% End Waypoint %%\n"
    );
    assert_eq!(
        engine.vault().content("X/X.md").unwrap(),
        "%% Begin Waypoint %%\n- **[[Sub]]**\n%% End Waypoint %%"
    );
}

#[test(tokio::test)]
async fn marker_in_outside_note_collapses_enclosing_listing() {
    let vault = vault_from(&[
        ("X.md", "%% Waypoint %%"),
        ("X/Sub.md", "# Sub\n"),
        ("X/Sub/item.md", ""),
    ]);
    let settings = WaypointSettings {
        folder_note_type: FolderNoteType::OutsideFolder,
        ..WaypointSettings::default()
    };
    let (engine, _clock) = engine_with_clock(vault, settings);
    engine.detect_marker(&Node::document("X.md")).await.unwrap();
    assert_eq!(
        engine.vault().content("X.md").unwrap(),
        "%% Begin Waypoint %%\n- **[[Sub]]**\n\t- [[item]]\n%% End Waypoint %%"
    );

    let sub = engine
        .vault()
        .insert_document("X/Sub.md", "# Sub\n%% Waypoint %%\n");
    assert_eq!(
        engine.detect_marker(&sub).await.unwrap(),
        MarkerOutcome::FolderNote
    );

    assert_eq!(
        engine.vault().content("X/Sub.md").unwrap(),
        "# Sub\n%% Begin Waypoint %%\n- [[item]]\n%% End Waypoint %%\n"
    );
    assert_eq!(
        engine.vault().content("X.md").unwrap(),
        "%% Begin Waypoint %%\n- **[[Sub]]**\n%% End Waypoint %%"
    );
}

#[test(tokio::test)]
async fn root_pointer_governs_top_level_folders() {
    let (engine, _clock) = engine_with_clock(project_vault(), WaypointSettings::default());
    engine
        .detect_marker(&Node::document("Projects/Projects.md"))
        .await
        .unwrap();
    engine
        .vault()
        .insert_document("Home.md", "# Home\n%% Waypoint %%\n");
    engine
        .detect_marker(&Node::document("Home.md"))
        .await
        .unwrap();

    // Directly inside a top level folder: only the root note is refreshed
    let before = engine.vault().content("Projects/Projects.md").unwrap();
    let node = engine.vault().insert_document("Projects/Draft.md", "");
    engine.on_store_event(StoreEvent::Created(node)).await.unwrap();
    assert_eq!(engine.vault().content("Projects/Projects.md").unwrap(), before);

    // One level further down the walk reaches the folder note
    let node = engine.vault().insert_document("Projects/Beta/Notes.md", "");
    engine.on_store_event(StoreEvent::Created(node)).await.unwrap();
    engine.flush().await;
    let content = engine.vault().content("Projects/Projects.md").unwrap();
    assert!(content.contains("- **Beta**\n\t- [[Notes]]\n\t- [[Spec]]\n- [[Draft]]\n"));
}
