use patchflow_core::{
    validate_patch, AllocationRequest, BulkEdit, FixtureId, FixtureLibrary, FixtureType, Patch,
    PatchConfig, Placement,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add {
        fid: u32,
        universe: u16,
        address: u16,
        quantity: u32,
        type_idx: usize,
    },
    Move {
        pick: usize,
        universe: u16,
        address: u16,
    },
    Bulk {
        skip: usize,
        take: usize,
        fid_base: Option<u32>,
        placement: Option<(u16, u16)>,
        type_idx: Option<usize>,
    },
    Remove {
        pick: usize,
    },
}

const TYPES: [&str; 3] = ["dim", "par", "spot"];

fn library() -> FixtureLibrary {
    FixtureLibrary::from_types(vec![
        FixtureType::new("dim", "Generic", "Dimmer", "1ch", 1),
        FixtureType::new("par", "Acme", "Par", "7ch", 7),
        FixtureType::new("spot", "Other", "Spot", "37ch", 37),
    ])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..60, 1u16..=3, 1u16..=512, 1u32..20, 0usize..3).prop_map(
            |(fid, universe, address, quantity, type_idx)| Op::Add {
                fid,
                universe,
                address,
                quantity,
                type_idx,
            }
        ),
        (any::<usize>(), 1u16..=3, 1u16..=512).prop_map(|(pick, universe, address)| Op::Move {
            pick,
            universe,
            address,
        }),
        (
            any::<usize>(),
            1usize..6,
            proptest::option::of(1u32..60),
            proptest::option::of((1u16..=3, 1u16..=512)),
            proptest::option::of(0usize..3),
        )
            .prop_map(|(skip, take, fid_base, placement, type_idx)| Op::Bulk {
                skip,
                take,
                fid_base,
                placement,
                type_idx,
            }),
        any::<usize>().prop_map(|pick| Op::Remove { pick }),
    ]
}

fn pick(patch: &Patch, n: usize) -> Option<FixtureId> {
    let fixtures = patch.fixtures();
    if fixtures.is_empty() {
        None
    } else {
        Some(fixtures[n % fixtures.len()].id.clone())
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_any_sequence(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut patch = Patch::new(library(), PatchConfig { max_universes: 3, ..Default::default() });

        for op in ops {
            let before = patch.clone();
            let result = match op {
                Op::Add { fid, universe, address, quantity, type_idx } => patch
                    .add_fixtures(
                        &AllocationRequest::single(fid, universe, address, TYPES[type_idx], "Unit")
                            .with_quantity(quantity),
                    )
                    .map(|_| ()),
                Op::Move { pick: n, universe, address } => match pick(&patch, n) {
                    Some(id) => {
                        let mut edit = patchflow_core::FixtureEdit::from_fixture(
                            patch.fixture(&id).unwrap(),
                        );
                        edit.universe = universe;
                        edit.address = address;
                        patch.edit_fixture(&id, &edit)
                    }
                    None => Ok(()),
                },
                Op::Bulk { skip, take, fid_base, placement, type_idx } => {
                    let fixtures = patch.fixtures();
                    let targets: Vec<FixtureId> = if fixtures.is_empty() {
                        Vec::new()
                    } else {
                        let start = skip % fixtures.len();
                        fixtures.iter().skip(start).take(take).map(|f| f.id.clone()).collect()
                    };
                    let edit = BulkEdit {
                        fid_base,
                        placement: placement.map(|(universe, address)| Placement { universe, address }),
                        type_id: type_idx.map(|i| TYPES[i].to_string()),
                        ..Default::default()
                    };
                    patch.bulk_edit(&targets, &edit)
                }
                Op::Remove { pick: n } => {
                    if let Some(id) = pick(&patch, n) {
                        patch.remove_fixture(&id);
                    }
                    Ok(())
                }
            };

            if result.is_err() {
                prop_assert_eq!(&patch, &before);
            }
            prop_assert!(validate_patch(patch.fixtures(), patch.library(), 3).is_ok());
        }
    }
}
