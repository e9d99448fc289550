//! Tests for the project database queries
//!
//! Each test builds a throwaway project database with `init_project_database`,
//! seeds it with a small coded project and reads it back.

use qda_common::analysis::{aggregate, calculate_agreement, tally_codings, CodeTree, CoderPair, EntityRef};
use qda_common::db::{self, AttributeFilter, AttributeOperator, AttributeTarget, SegmentQuery};
use qda_common::model::SegmentRegion;
use qda_common::Error;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn seeded_project() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("study.qda").join("data.qda");
    let pool = db::init_project_database(&db_path)
        .await
        .expect("Should create project database");

    let statements = [
        "INSERT INTO code_cat (catid, name, owner, supercatid) VALUES (1, 'Feelings', 'ann', NULL)",
        "INSERT INTO code_cat (catid, name, owner, supercatid) VALUES (2, 'Good', 'ann', 1)",
        "INSERT INTO code_name (cid, name, catid, owner, color) VALUES (10, 'happy', 2, 'ann', '#F8E0E0')",
        "INSERT INTO code_name (cid, name, catid, owner, color) VALUES (11, 'sad', 1, 'ann', '#E0E0F8')",
        "INSERT INTO code_name (cid, name, catid, owner, color) VALUES (12, 'unsorted', NULL, 'ben', NULL)",
        "INSERT INTO source (id, name, fulltext, mediapath) VALUES (1, 'interview1.txt', 'I was happy then sad and happy again, mostly.', NULL)",
        "INSERT INTO source (id, name, fulltext, mediapath) VALUES (2, 'interview2.txt', 'Nothing much happened.', NULL)",
        "INSERT INTO source (id, name, fulltext, mediapath) VALUES (3, 'photo.jpg', NULL, '/images/photo.jpg')",
        "INSERT INTO code_text (cid, fid, seltext, pos0, pos1, owner) VALUES (10, 1, 'happy', 6, 11, 'ann')",
        "INSERT INTO code_text (cid, fid, seltext, pos0, pos1, owner) VALUES (10, 1, 'happy', 6, 11, 'ben')",
        "INSERT INTO code_text (cid, fid, seltext, pos0, pos1, owner) VALUES (10, 1, 'happy again', 25, 36, 'ann')",
        "INSERT INTO code_text (cid, fid, seltext, pos0, pos1, owner) VALUES (11, 1, 'sad', 17, 20, 'ben')",
        "INSERT INTO code_image (id, x1, y1, width, height, cid, memo, owner) VALUES (3, 0, 0, 10, 10, 12, 'smiling face', 'carl')",
        "INSERT INTO code_av (id, pos0, pos1, cid, memo, owner) VALUES (3, 0, 100, 12, 'laughter', 'dora')",
        "INSERT INTO cases (caseid, name) VALUES (1, 'Participant A')",
        "INSERT INTO cases (caseid, name) VALUES (2, 'Participant B')",
        "INSERT INTO case_text (caseid, fid, pos0, pos1) VALUES (1, 1, 0, 15)",
        "INSERT INTO case_text (caseid, fid, pos0, pos1) VALUES (2, 1, 15, 45)",
        "INSERT INTO case_text (caseid, fid, pos0, pos1) VALUES (2, 3, 0, 0)",
        "INSERT INTO attribute (name, attr_type, value, id) VALUES ('language', 'file', 'english', 1)",
        "INSERT INTO attribute (name, attr_type, value, id) VALUES ('language', 'file', 'french', 2)",
        "INSERT INTO attribute (name, attr_type, value, id) VALUES ('language', 'file', 'english', 3)",
        "INSERT INTO attribute (name, attr_type, value, id) VALUES ('age', 'case', '34', 1)",
        "INSERT INTO attribute (name, attr_type, value, id) VALUES ('age', 'case', '9', 2)",
    ];
    for statement in statements {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Should seed project database");
    }

    (dir, pool)
}

#[tokio::test]
async fn test_load_categories_and_codes() {
    let (_dir, pool) = seeded_project().await;

    let categories = db::load_categories(&pool).await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].name, "Feelings");
    assert_eq!(categories[1].parent_id, Some(1));

    let codes = db::load_codes(&pool).await.unwrap();
    let names: Vec<&str> = codes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["happy", "sad", "unsorted"]);
    assert_eq!(codes[0].color.as_deref(), Some("#F8E0E0"));
    assert_eq!(codes[2].category_id, None);
}

#[tokio::test]
async fn test_coder_lists() {
    let (_dir, pool) = seeded_project().await;

    let frequency = db::load_frequency_coders(&pool).await.unwrap();
    assert_eq!(frequency, vec!["ann", "ben", "carl"]);

    let comparison = db::load_comparison_coders(&pool).await.unwrap();
    assert_eq!(comparison, vec!["ann", "ben", "carl", "dora"]);
}

#[tokio::test]
async fn test_document_lengths_exclude_media() {
    let (_dir, pool) = seeded_project().await;

    let lengths = db::load_text_document_lengths(&pool).await.unwrap();
    assert_eq!(lengths.len(), 2);
    assert_eq!(lengths[0].document_id, 1);
    assert_eq!(lengths[0].length, 45);
    assert_eq!(lengths[1].length, 22);
}

#[tokio::test]
async fn test_text_intervals_for_selected_coders() {
    let (_dir, pool) = seeded_project().await;

    let intervals = db::load_text_intervals(&pool, &["ann"]).await.unwrap();
    assert_eq!(intervals.len(), 2);
    assert!(intervals.iter().all(|i| i.coder == "ann"));

    let none = db::load_text_intervals(&pool, &[]).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_frequencies_from_database() {
    let (_dir, pool) = seeded_project().await;

    let tree = CodeTree::build(
        &db::load_categories(&pool).await.unwrap(),
        &db::load_codes(&pool).await.unwrap(),
    )
    .unwrap();
    let coders = db::load_frequency_coders(&pool).await.unwrap();
    let counts = tally_codings(&db::load_coding_owners(&pool).await.unwrap());
    let report = aggregate(&tree, &coders, &counts);

    assert_eq!(report.count(EntityRef::Code(10), "ann"), Some(2));
    assert_eq!(report.count(EntityRef::Category(1), "ann"), Some(2));
    assert_eq!(report.count(EntityRef::Category(1), "ben"), Some(2));
    assert_eq!(report.get(EntityRef::Category(1)).unwrap().total, 4);
    assert_eq!(report.count(EntityRef::Code(12), "carl"), Some(1));
}

#[tokio::test]
async fn test_agreement_from_database() {
    let (_dir, pool) = seeded_project().await;

    let pair = CoderPair::new("ann", "ben").unwrap();
    let documents = db::load_text_document_lengths(&pool).await.unwrap();
    let intervals = db::load_text_intervals(&pool, &["ann", "ben"]).await.unwrap();
    let summary = calculate_agreement(10, &pair, &documents, &intervals).unwrap();

    assert_eq!(summary.characters, 67);
    assert_eq!(summary.dual_coded, 5);
    assert_eq!(summary.single_coded, 11);
    assert_eq!(summary.coded_first, 16);
    assert_eq!(summary.coded_second, 5);
    assert_eq!(summary.unique_codings, 16);
}

#[tokio::test]
async fn test_segment_search_filters() {
    let (_dir, pool) = seeded_project().await;

    let all = SegmentQuery {
        code_ids: vec![10, 11],
        ..Default::default()
    };
    assert_eq!(db::count_segments(&pool, &all).await.unwrap(), 4);
    let segments = db::search_segments(&pool, &all, 100, 0).await.unwrap();
    assert_eq!(segments.len(), 4);
    assert_eq!(segments[0].code_name, "happy");
    assert_eq!(segments[0].file_name, "interview1.txt");

    let by_coder = SegmentQuery {
        coder: Some("ben".to_string()),
        ..all.clone()
    };
    assert_eq!(db::count_segments(&pool, &by_coder).await.unwrap(), 2);

    let by_text = SegmentQuery {
        search_text: Some("again".to_string()),
        ..all.clone()
    };
    let found = db::search_segments(&pool, &by_text, 100, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].region,
        SegmentRegion::Text {
            start: 25,
            end: 36,
            text: Some("happy again".to_string()),
        }
    );

    let by_case = SegmentQuery {
        case_ids: vec![1],
        ..all.clone()
    };
    assert_eq!(db::count_segments(&pool, &by_case).await.unwrap(), 2);

    let by_file = SegmentQuery {
        file_ids: vec![2],
        ..all.clone()
    };
    assert_eq!(db::count_segments(&pool, &by_file).await.unwrap(), 0);

    let paged = db::search_segments(&pool, &all, 2, 2).await.unwrap();
    assert_eq!(paged.len(), 2);
}

#[tokio::test]
async fn test_segment_search_without_codes_matches_nothing() {
    let (_dir, pool) = seeded_project().await;

    let query = SegmentQuery::default();
    assert_eq!(db::count_segments(&pool, &query).await.unwrap(), 0);
    assert!(db::search_segments(&pool, &query, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_segment_search_includes_image_and_av() {
    let (_dir, pool) = seeded_project().await;

    let unsorted = SegmentQuery {
        code_ids: vec![12],
        ..Default::default()
    };
    let segments = db::search_segments(&pool, &unsorted, 100, 0).await.unwrap();
    assert_eq!(segments.len(), 2);

    assert_eq!(segments[0].file_name, "photo.jpg");
    assert_eq!(segments[0].media_path.as_deref(), Some("/images/photo.jpg"));
    assert_eq!(segments[0].coder.as_deref(), Some("carl"));
    assert_eq!(segments[0].memo.as_deref(), Some("smiling face"));
    assert_eq!(
        segments[0].region,
        SegmentRegion::Image {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        }
    );

    assert_eq!(segments[1].coder.as_deref(), Some("dora"));
    assert_eq!(segments[1].region, SegmentRegion::Av { start: 0, end: 100 });

    // Image and av memos are matched by the search text
    let by_memo = SegmentQuery {
        search_text: Some("laugh".to_string()),
        ..unsorted.clone()
    };
    let found = db::search_segments(&pool, &by_memo, 100, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].region, SegmentRegion::Av { start: 0, end: 100 });

    let by_coder = SegmentQuery {
        coder: Some("carl".to_string()),
        ..unsorted.clone()
    };
    assert_eq!(db::count_segments(&pool, &by_coder).await.unwrap(), 1);

    let by_file = SegmentQuery {
        file_ids: vec![3],
        ..unsorted.clone()
    };
    assert_eq!(db::count_segments(&pool, &by_file).await.unwrap(), 2);

    // Media segments belong to every case linked to their file
    let linked_case = SegmentQuery {
        case_ids: vec![2],
        ..unsorted.clone()
    };
    assert_eq!(db::count_segments(&pool, &linked_case).await.unwrap(), 2);
    let other_case = SegmentQuery {
        case_ids: vec![1],
        ..unsorted.clone()
    };
    assert_eq!(db::count_segments(&pool, &other_case).await.unwrap(), 0);
}

fn attribute(
    name: &str,
    target: AttributeTarget,
    operator: AttributeOperator,
    values: &[&str],
    numeric: bool,
) -> AttributeFilter {
    AttributeFilter {
        name: name.to_string(),
        target,
        operator,
        values: values.iter().map(|v| v.to_string()).collect(),
        numeric,
    }
}

fn with_attributes(attributes: Vec<AttributeFilter>) -> SegmentQuery {
    SegmentQuery {
        code_ids: vec![10, 11, 12],
        attributes,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_segment_search_by_file_attribute() {
    let (_dir, pool) = seeded_project().await;

    let english = with_attributes(vec![attribute(
        "language",
        AttributeTarget::File,
        AttributeOperator::Equal,
        &["english"],
        false,
    )]);
    // Four text segments in interview1.txt, one image and one av in photo.jpg
    assert_eq!(db::count_segments(&pool, &english).await.unwrap(), 6);

    let french = with_attributes(vec![attribute(
        "language",
        AttributeTarget::File,
        AttributeOperator::In,
        &["french", "german"],
        false,
    )]);
    assert_eq!(db::count_segments(&pool, &french).await.unwrap(), 0);

    let not_french = with_attributes(vec![attribute(
        "language",
        AttributeTarget::File,
        AttributeOperator::NotIn,
        &["french"],
        false,
    )]);
    assert_eq!(db::count_segments(&pool, &not_french).await.unwrap(), 6);
}

#[tokio::test]
async fn test_segment_search_by_case_attribute() {
    let (_dir, pool) = seeded_project().await;

    // As text '9' > '18', so both cases match
    let as_text = with_attributes(vec![attribute(
        "age",
        AttributeTarget::Case,
        AttributeOperator::Greater,
        &["18"],
        false,
    )]);
    assert_eq!(db::count_segments(&pool, &as_text).await.unwrap(), 6);

    // Numerically only Participant A (34) is older than 18
    let adults = with_attributes(vec![attribute(
        "age",
        AttributeTarget::Case,
        AttributeOperator::Greater,
        &["18"],
        true,
    )]);
    let segments = db::search_segments(&pool, &adults, 100, 0).await.unwrap();
    assert_eq!(segments.len(), 2);
    assert!(segments
        .iter()
        .all(|s| matches!(s.region, SegmentRegion::Text { start: 6, end: 11, .. })));

    let children = with_attributes(vec![attribute(
        "age",
        AttributeTarget::Case,
        AttributeOperator::Between,
        &["5", "10"],
        true,
    )]);
    // sad and 'happy again' inside Participant B's span, plus the photo codings
    assert_eq!(db::count_segments(&pool, &children).await.unwrap(), 4);

    let combined = with_attributes(vec![
        attribute("age", AttributeTarget::Case, AttributeOperator::Between, &["5", "10"], true),
        attribute("language", AttributeTarget::File, AttributeOperator::Equal, &["english"], false),
        attribute("language", AttributeTarget::File, AttributeOperator::Like, &["eng%"], false),
    ]);
    assert_eq!(db::count_segments(&pool, &combined).await.unwrap(), 4);
}

#[tokio::test]
async fn test_segment_search_rejects_malformed_attribute() {
    let (_dir, pool) = seeded_project().await;

    let query = with_attributes(vec![attribute(
        "age",
        AttributeTarget::Case,
        AttributeOperator::Between,
        &["5"],
        true,
    )]);
    let err = db::search_segments(&pool, &query, 10, 0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(db::count_segments(&pool, &query).await.is_err());
}
