use criterion::{black_box, criterion_group, criterion_main, Criterion};
use larder::{
    recipe::{RecipeRequest, RecipeRequestParts},
    Converter, Item, Macro, Quantity, StorageType, Unit,
};

fn conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversions");
    let converter = Converter::default();

    let input = vec![
        (1.5, Unit::Pounds),
        (2.0, Unit::Ounces),
        (3.0, Unit::Kilograms),
        (300.0, Unit::Milliliters),
        (1.5, Unit::Liters),
        (20.0, Unit::Grams),
    ]
    .into_iter()
    .map(|(v, u)| Quantity::new(v, u).unwrap())
    .collect::<Vec<_>>();

    let input = black_box(input);

    group.bench_function("add-in-left-unit", |b| {
        b.iter(|| {
            let grams = Quantity::zero(Unit::Grams);
            let mls = Quantity::zero(Unit::Milliliters);
            for q in &input {
                let _ = grams.add(q, &converter);
                let _ = mls.add(q, &converter);
            }
        })
    });

    group.bench_function("parse-text", |b| {
        b.iter(|| {
            for text in ["500%g", "1.5 lb", "2 Tablespoons", "8 fl. oz", "3"] {
                let _ = black_box(text).parse::<Quantity>();
            }
        })
    });
}

fn feasibility(c: &mut Criterion) {
    let converter = Converter::default();
    let items = (0..200)
        .map(|i| {
            Item::builder(
                format!("item {}", i % 50),
                Quantity::new(100.0 + i as f64, Unit::Grams).unwrap(),
                StorageType::Pantry,
            )
            .shelf_life_text(format!("{} days", i + 1))
            .serving_size(Quantity::new(50.0, Unit::Grams).unwrap())
            .macro_(Macro::Protein, Quantity::new(3.0, Unit::Grams).unwrap())
            .build()
            .unwrap()
        })
        .collect::<Vec<_>>();
    let mut request = RecipeRequest::new(RecipeRequestParts {
        name: "everything".into(),
        instructions: [(1, "Mix".to_string())].into(),
        ingredients: (0..50)
            .map(|i| (format!("Item {i}"), Quantity::new(1.0, Unit::Pounds).unwrap()))
            .collect(),
        ..Default::default()
    })
    .unwrap();

    c.bench_function("feasibility-200-lots", |b| {
        b.iter(|| black_box(request.check_feasibility(&items, &converter)))
    });
    c.bench_function("nutrition-200-lots", |b| {
        b.iter(|| request.update_nutritional_facts(&items, &converter))
    });
}

criterion_group!(benches, conversions, feasibility);
criterion_main!(benches);
