//! Integration tests: the three reference adapters wired into one district
//! and driven through warm-up and regular stepping.

use std::collections::BTreeSet;

use cs_adapter::{
    Adapter, AttrValue, EntityInputs, Inputs, NextStep, Outputs, Producers, Requests, Simulator,
};
use cs_models::{
    DhNetwork, DhNetworkParams, FlexController, FlexControllerParams, HexConsumer,
    HexConsumerParams,
};

const NET: &str = "DHNetwork_0";
const CTRL: &str = "FHctrl_0";
const HEX1: &str = "HEXConsumer_0";
const HEX2: &str = "HEXConsumer_1";
const P_HEAT: f64 = 83_600.0;

fn wire(value: AttrValue) -> Producers {
    let mut producers = Producers::new();
    producers.insert("orchestrator".to_string(), Some(value));
    producers
}

fn batch(entries: Vec<(&str, AttrValue)>) -> EntityInputs {
    entries
        .into_iter()
        .map(|(attr, value)| (attr.to_string(), wire(value)))
        .collect()
}

fn request(eids: &[&str], attrs: &[&str]) -> Requests {
    eids.iter()
        .map(|eid| (eid.to_string(), attrs.iter().map(|a| a.to_string()).collect()))
        .collect()
}

fn pick(outputs: &Outputs, eid: &str, attr: &str) -> AttrValue {
    outputs
        .entities
        .iter()
        .find(|(id, _)| id.as_str() == eid)
        .and_then(|(_, data)| data.get(attr))
        .cloned()
        .unwrap_or_else(|| panic!("{eid}.{attr} missing"))
}

fn real(outputs: &Outputs, eid: &str, attr: &str) -> f64 {
    pick(outputs, eid, attr).as_real().unwrap()
}

struct District {
    net: Adapter<DhNetwork>,
    ctrl: Adapter<FlexController>,
    hex: Adapter<HexConsumer>,
}

impl District {
    fn new() -> Self {
        let mut net = Adapter::<DhNetwork>::with_defaults().unwrap();
        net.init(10, None).unwrap();
        net.create(1, DhNetwork::KIND, DhNetworkParams::default())
            .unwrap();

        let mut ctrl = Adapter::<FlexController>::with_defaults().unwrap();
        ctrl.init(10, None).unwrap();
        ctrl.create(1, FlexController::KIND, FlexControllerParams::default())
            .unwrap();

        let mut hex = Adapter::<HexConsumer>::with_defaults().unwrap();
        hex.init(10, None).unwrap();
        let params = HexConsumerParams {
            p_heat: P_HEAT,
            mdot_hex_in: 0.5,
            mdot_hex_out: -0.5,
            ..HexConsumerParams::default()
        };
        hex.create(2, HexConsumer::KIND, params).unwrap();

        Self { net, ctrl, hex }
    }

    /// One orchestrator round at `time`: substations, controller, network.
    fn round(&mut self, time: u64) -> (NextStep, NextStep, NextStep) {
        let net_out = self
            .net
            .get_data(&request(
                &[NET],
                &["T_supply_cons1", "T_supply_cons2", "initialized"],
            ))
            .unwrap();
        let status = pick(&net_out, NET, "initialized");

        let mut hex_in = Inputs::new();
        for (eid, supply) in [(HEX1, "T_supply_cons1"), (HEX2, "T_supply_cons2")] {
            hex_in.insert(
                eid.to_string(),
                batch(vec![
                    ("T_supply", pick(&net_out, NET, supply)),
                    ("initialized", status.clone()),
                ]),
            );
        }
        let hex_next = self.hex.step(time, &hex_in, None).unwrap();
        let hex_out = self
            .hex
            .get_data(&request(&[HEX1, HEX2], &["mdot_hex_in"]))
            .unwrap();

        let mut ctrl_in = Inputs::new();
        ctrl_in.insert(
            CTRL.to_string(),
            batch(vec![
                ("mdot_HEX1", pick(&hex_out, HEX1, "mdot_hex_in")),
                ("mdot_HEX2", pick(&hex_out, HEX2, "mdot_hex_in")),
                ("T_tank_hot", AttrValue::Real(70.0)),
                ("T_hp_cond_in", AttrValue::Real(40.0)),
                ("T_hp_cond_out", AttrValue::Real(75.0)),
                ("T_hp_evap_in", AttrValue::Real(30.0)),
                ("T_hp_evap_out", AttrValue::Real(25.0)),
                ("P_hp_effective", AttrValue::Real(0.0)),
                ("initialized", status),
            ]),
        );
        let ctrl_next = self.ctrl.step(time, &ctrl_in, None).unwrap();
        let ctrl_out = self
            .ctrl
            .get_data(&request(&[CTRL], &["mdot_1_supply", "mdot_2_supply"]))
            .unwrap();

        let mut net_in = Inputs::new();
        net_in.insert(
            NET.to_string(),
            batch(vec![
                ("T_tank_forward", AttrValue::Real(70.0)),
                ("Qdot_evap", AttrValue::Real(0.0)),
                ("mdot_cons1_set", pick(&hex_out, HEX1, "mdot_hex_in")),
                ("mdot_cons2_set", pick(&hex_out, HEX2, "mdot_hex_in")),
                ("Qdot_cons1", AttrValue::Real(P_HEAT)),
                ("Qdot_cons2", AttrValue::Real(P_HEAT)),
                ("mdot_grid_set", pick(&ctrl_out, CTRL, "mdot_1_supply")),
                ("mdot_tank_in_set", pick(&ctrl_out, CTRL, "mdot_2_supply")),
            ]),
        );
        let net_next = self.net.step(time, &net_in, None).unwrap();

        (net_next, ctrl_next, hex_next)
    }
}

#[test]
fn district_warms_up_then_advances() {
    let mut district = District::new();

    for call in 1..=5 {
        let (net, ctrl, hex) = district.round(0);
        assert_eq!(net, NextStep::Wait, "network call {call}");
        assert_eq!(ctrl, NextStep::Wait, "controller call {call}");
        assert_eq!(hex, NextStep::At(10), "substations never wait");
    }
    let (net, ctrl, _) = district.round(0);
    assert_eq!(net, NextStep::At(10));
    assert_eq!(ctrl, NextStep::At(10));
    assert!(district.net.all_settled());
    assert!(district.ctrl.all_settled());

    let net_out = district
        .net
        .get_data(&request(&[NET], &["initialized"]))
        .unwrap();
    assert_eq!(net_out.time, Some(10));
    assert_eq!(pick(&net_out, NET, "initialized").as_flag(), Some(true));

    let hex_out = district
        .hex
        .get_data(&request(&[HEX1], &["mdot_hex_in"]))
        .unwrap();
    assert_eq!(hex_out.time, None);
    assert_eq!(real(&hex_out, HEX1, "mdot_hex_in"), 0.5);
}

#[test]
fn substations_follow_demand_once_network_is_initialized() {
    let mut district = District::new();
    while district.round(0).0.is_wait() {}

    let mut time = 10;
    for _ in 0..30 {
        let (net, ctrl, hex) = district.round(time);
        assert_eq!(net, NextStep::At(time + 10));
        assert_eq!(ctrl, NextStep::At(time + 10));
        assert_eq!(hex, NextStep::At(time + 10));
        time += 10;
    }

    let hex_out = district
        .hex
        .get_data(&request(&[HEX1], &["mdot_hex_in", "mdot_hex_out", "T_return"]))
        .unwrap();
    let mdot = real(&hex_out, HEX1, "mdot_hex_in");
    assert!(mdot > 0.5, "valve opened toward the required flow, got {mdot}");
    assert_eq!(real(&hex_out, HEX1, "mdot_hex_out"), -mdot);
    assert!(real(&hex_out, HEX1, "T_return") >= 40.0);

    let net_out = district
        .net
        .get_data(&request(
            &[NET],
            &["mdot_grid", "mdot_tank_in", "mdot_cons1", "mdot_cons2"],
        ))
        .unwrap();
    assert_eq!(net_out.time, Some(time));
    let balance = real(&net_out, NET, "mdot_grid") + real(&net_out, NET, "mdot_tank_in")
        - real(&net_out, NET, "mdot_cons1")
        - real(&net_out, NET, "mdot_cons2");
    assert!(balance.abs() < 1e-9);

    let ctrl_out = district
        .ctrl
        .get_data(&request(&[CTRL], &["state", "hp_on_request"]))
        .unwrap();
    assert_eq!(pick(&ctrl_out, CTRL, "state"), AttrValue::Int(1));
    assert_eq!(pick(&ctrl_out, CTRL, "hp_on_request"), AttrValue::Flag(false));
}

fn sorted(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(String::as_str).collect()
}

#[test]
fn catalogs_match_the_published_attribute_sets() {
    let net = Adapter::<DhNetwork>::with_defaults().unwrap().describe();
    let model = &net.models["DHNetwork"];
    assert_eq!(net.api_type, "hybrid");
    assert_eq!(model.trigger, ["T_tank_forward", "Qdot_evap"]);
    assert_eq!(model.non_persistent, ["T_return_tank"]);
    assert_eq!(model.inputs.len(), 8);
    assert_eq!(model.outputs.len(), 13);
    assert_eq!(model.params.len(), 5);

    let ctrl = Adapter::<FlexController>::with_defaults().unwrap().describe();
    let model = &ctrl.models["SimpleFlexHeatController"];
    assert_eq!(
        sorted(&model.trigger),
        BTreeSet::from([
            "P_hp_effective",
            "T_hp_cond_out",
            "T_hp_cond_in",
            "T_hp_evap_in",
            "mdot_HEX1",
            "mdot_HEX2"
        ])
    );
    assert_eq!(
        sorted(&model.non_persistent),
        BTreeSet::from(["Q_HP_set", "mdot_HP_out", "mdot_2_return", "mdot_3_supply"])
    );
    assert!(model.inputs.contains(&"initialized".to_string()));
    assert!(!model.outputs.contains(&"initialized".to_string()));
    assert_eq!(model.attrs.len(), 22);

    let hex = Adapter::<HexConsumer>::with_defaults().unwrap().describe();
    let model = &hex.models["HEXConsumer"];
    assert_eq!(model.inputs, ["P_heat", "T_supply", "initialized"]);
    assert_eq!(model.outputs, ["mdot_hex_out", "mdot_hex_in", "T_return"]);
    assert_eq!(model.trigger, ["T_supply", "initialized"]);
    assert_eq!(model.non_persistent, ["mdot_hex_out"]);
}

#[test]
fn network_rejects_text_in_numeric_field() {
    let mut net = Adapter::<DhNetwork>::with_defaults().unwrap();
    net.create(1, DhNetwork::KIND, DhNetworkParams::default())
        .unwrap();
    let mut inputs = Inputs::new();
    inputs.insert(
        NET.to_string(),
        batch(vec![("T_tank_forward", AttrValue::Text("hot".into()))]),
    );
    let err = net.step(0, &inputs, None).unwrap_err();
    assert!(matches!(err, cs_adapter::AdapterError::TypeMismatch { .. }));
}

#[test]
fn invalid_params_surface_as_model_errors() {
    let mut hex = Adapter::<HexConsumer>::with_defaults().unwrap();
    let params = HexConsumerParams {
        mdot_max: -1.0,
        ..HexConsumerParams::default()
    };
    let err = hex.create(1, HexConsumer::KIND, params).unwrap_err();
    assert!(err.to_string().contains("mdot_max"));
    assert_eq!(hex.entities().count(), 0);
}

#[test]
fn grid_supply_temperature_is_readable() {
    let mut net = Adapter::<DhNetwork>::with_defaults().unwrap();
    let params = DhNetworkParams {
        t_supply_grid: 82.0,
        ..DhNetworkParams::default()
    };
    net.create(1, DhNetwork::KIND, params).unwrap();
    let out = net
        .get_data(&request(&[NET], &["T_supply_grid"]))
        .unwrap();
    assert_eq!(real(&out, NET, "T_supply_grid"), 82.0);
}
