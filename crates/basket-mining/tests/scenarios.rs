use basket_core::{BasketError, Cell, RawTable};
use basket_mining::{
    analyze, build_cooccurrence, encode, generate_rules, mine, profile_dataset, AnalysisOptions,
    InputLayout, Itemset,
};

fn bread_milk_butter() -> RawTable {
    RawTable::single_column(
        "items",
        ["bread,milk", "bread,butter", "milk,butter", "bread,milk,butter"],
    )
}

#[test]
fn bread_milk_butter_end_to_end() {
    let dataset = encode(&bread_milk_butter()).unwrap();
    let itemsets = mine(&dataset.matrix, 0.5).unwrap();

    let supports: Vec<(String, f64)> = itemsets
        .iter()
        .map(|f| (f.itemset.to_string(), f.support))
        .collect();
    assert_eq!(
        supports,
        vec![
            ("{bread}".to_string(), 0.75),
            ("{butter}".to_string(), 0.75),
            ("{milk}".to_string(), 0.75),
            ("{bread, butter}".to_string(), 0.5),
            ("{bread, milk}".to_string(), 0.5),
            ("{butter, milk}".to_string(), 0.5),
        ]
    );

    let rules = generate_rules(&itemsets, 0.6).unwrap();
    let bread_milk = rules
        .iter()
        .find(|r| r.antecedent == Itemset::new(["bread"]) && r.consequent == Itemset::new(["milk"]))
        .unwrap();
    assert!((bread_milk.confidence - 0.667).abs() < 1e-3);
    assert!((bread_milk.lift - 0.889).abs() < 1e-3);
}

#[test]
fn three_by_three_single_column() {
    let table = RawTable::single_column("items", ["a,b", "a,c", "b,c"]);
    let dataset = encode(&table).unwrap();
    assert_eq!(dataset.matrix.n_transactions(), 3);
    assert_eq!(dataset.matrix.items(), &["a", "b", "c"]);
    for col in 0..3 {
        assert_eq!(dataset.matrix.item_count(col), 2);
    }

    let co = build_cooccurrence(&dataset.matrix);
    assert_eq!(co.counts, vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]);
}

#[test]
fn empty_table_fails() {
    let err = encode(&RawTable::new(vec!["items".into()], vec![])).unwrap_err();
    assert!(matches!(err, BasketError::EmptyDataset));
}

#[test]
fn grouped_order_table_profiles_and_analyzes() {
    let rows = [
        ("1001", "coffee"),
        ("1001", "croissant"),
        ("1002", "coffee"),
        ("1002", "muffin"),
        ("1003", "coffee"),
        ("1003", "croissant"),
        ("1004", "tea"),
    ];
    let table = RawTable::new(
        vec!["order_id".into(), "item_name".into()],
        rows.iter()
            .map(|(id, item)| vec![Cell::parse(id), Cell::parse(item)])
            .collect(),
    );
    let dataset = encode(&table).unwrap();
    assert_eq!(dataset.layout, InputLayout::GroupedIdItem);

    let profile = profile_dataset(&dataset);
    assert_eq!(profile.n_transactions, 4);
    assert_eq!(profile.most_frequent_item.unwrap().name, "coffee");

    let analysis = analyze("orders", &dataset, &AnalysisOptions::with_thresholds(0.5, 0.5)).unwrap();
    let rule = analysis
        .rules
        .iter()
        .find(|r| r.to_string() == "{croissant} => {coffee}")
        .unwrap();
    assert_eq!(rule.confidence, 1.0);
    let labels = analysis.labels.as_ref().unwrap();
    let supporting: Vec<&str> = rule
        .supporting_transactions
        .iter()
        .map(|&i| labels[i].as_str())
        .collect();
    assert_eq!(supporting, vec!["1001", "1003"]);
}

#[test]
fn analysis_serializes_with_camel_case_keys() {
    let dataset = encode(&bread_milk_butter()).unwrap();
    let analysis = analyze("doc", &dataset, &AnalysisOptions::with_thresholds(0.5, 0.6)).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["meta"]["nFrequentItemsets"], 6);
    assert_eq!(json["meta"]["layout"], "singleColumnList");
    assert!(json["meta"]["createdAt"].is_string());
    assert!(json["rules"][0]["supportingTransactions"].is_array());
    assert!(json["cooccurrence"]["counts"].is_array());
    assert!(json.get("labels").is_none());
}
