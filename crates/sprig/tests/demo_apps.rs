#![forbid(unsafe_code)]

//! End-to-end runs of small apps through the facade: a click counter, an
//! input-driven calculator, and a form with a memoized greeting.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sprig::prelude::*;
use sprig::{NodeId, PropValue, UnitBudgets, drive_until_idle};

fn mount(app: Element) -> (Renderer<MemoryHost>, NodeId) {
    let mut renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().root();
    renderer.render(app, root);
    renderer.flush().expect("initial render");
    (renderer, root)
}

fn dispatch(renderer: &mut Renderer<MemoryHost>, node: NodeId, event: Event) -> Result<()> {
    assert!(renderer.host().dispatch(node, &event) > 0, "no listener for {event:?}");
    renderer.flush()?;
    Ok(())
}

fn number_of(event: &Event) -> i64 {
    match event.value() {
        Some(PropValue::Int(v)) => *v,
        Some(PropValue::Str(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn text_of(event: &Event) -> String {
    event.value().map(ToString::to_string).unwrap_or_default()
}

// ============================================================================
// Counter
// ============================================================================

fn counter() -> Component {
    Component::new("Counter", |_, hooks| {
        let (num, set_num) = hooks.use_state(0_i64);
        Element::host("div")
            .child(
                Element::host("h1")
                    .on("onClick", EventHandler::new(move |_| set_num.update(|c| c + 1)))
                    .child("Count: ")
                    .child(num),
            )
            .build()
    })
}

#[test]
fn counter_counts_clicks() -> Result<()> {
    let (mut renderer, root) = mount(counter().element(Props::new()));
    assert_eq!(renderer.host().inner_markup(root), "<div><h1>Count: 0</h1></div>");

    let h1 = renderer.host().find_by_tag("h1")[0];
    dispatch(&mut renderer, h1, Event::new("click"))?;
    dispatch(&mut renderer, h1, Event::new("click"))?;
    assert_eq!(renderer.host().inner_markup(root), "<div><h1>Count: 2</h1></div>");
    assert_eq!(renderer.host().find_by_tag("h1"), vec![h1], "node reused");
    Ok(())
}

#[test]
fn counter_survives_sliced_rendering() -> Result<()> {
    let mut renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().root();
    renderer.render(counter().element(Props::new()), root);
    drive_until_idle(&mut renderer, &mut UnitBudgets::repeat(1))?;

    let h1 = renderer.host().find_by_tag("h1")[0];
    renderer.host().dispatch(h1, &Event::new("click"));
    renderer.host().dispatch(h1, &Event::new("click"));
    renderer.host().dispatch(h1, &Event::new("click"));
    let report = drive_until_idle(&mut renderer, &mut UnitBudgets::repeat(2))?;
    assert_eq!(report.commits, 1);
    assert_eq!(renderer.host().text_content(root), "Count: 3");
    Ok(())
}

// ============================================================================
// Calculator
// ============================================================================

fn calculator() -> Component {
    Component::new("Calculator", |_, hooks| {
        let (value, set_value) = hooks.use_state(0_i64);
        let result = 3 + value;
        Element::host("div")
            .child(
                Element::host("h1")
                    .child("3 + ")
                    .child(value)
                    .child(" = ")
                    .child(result),
            )
            .child(
                Element::host("input")
                    .prop("type", "number")
                    .prop("value", value)
                    .on(
                        "onChange",
                        EventHandler::new(move |event| set_value.set(number_of(event))),
                    ),
            )
            .build()
    })
}

#[test]
fn calculator_follows_input() -> Result<()> {
    let (mut renderer, root) = mount(calculator().element(Props::new()));
    assert_eq!(
        renderer.host().inner_markup(root),
        r#"<div><h1>3 + 0 = 3</h1><input type="number" value="0"></input></div>"#
    );

    let input = renderer.host().find_by_tag("input")[0];
    dispatch(&mut renderer, input, Event::with_value("change", "4"))?;
    assert_eq!(renderer.host().text_content(root), "3 + 4 = 7");
    assert_eq!(
        renderer.host().attribute(input, "value"),
        Some(&PropValue::Int(4))
    );

    dispatch(&mut renderer, input, Event::with_value("change", "not a number"))?;
    assert_eq!(renderer.host().text_content(root), "3 + 0 = 3");
    assert_eq!(renderer.host().listener_count(input, "change"), 1);
    Ok(())
}

// ============================================================================
// Form with memoized greeting
// ============================================================================

fn greeting(renders: &Rc<Cell<usize>>) -> Component {
    let renders = Rc::clone(renders);
    memo(
        Component::new("Greeting", move |props, _| {
            renders.set(renders.get() + 1);
            let name = props.get("name").and_then(PropValue::as_str).unwrap_or("");
            Element::host("div")
                .child(
                    Element::host("h3")
                        .child("Hello")
                        .child(if name.is_empty() { "" } else { ", " })
                        .child(name)
                        .child("!"),
                )
                .build()
        }),
        |prev, next| prev.get("name") == next.get("name"),
    )
}

fn form(greeting: Component) -> Component {
    Component::new("App", move |_, hooks| {
        let (name, set_name) = hooks.use_state(String::new());
        let (address, set_address) = hooks.use_state(String::new());
        let field = |label: &str, id: &str, value: &str, handler: EventHandler| {
            Element::host("label")
                .child(label.to_owned())
                .child(": ")
                .child(
                    Element::host("input")
                        .prop("id", id)
                        .prop("value", value)
                        .on("onChange", handler),
                )
                .build()
        };
        Element::host("div")
            .child(field(
                "Name",
                "name",
                name.as_str(),
                EventHandler::new(move |event| set_name.set(text_of(event))),
            ))
            .child(field(
                "Address",
                "address",
                address.as_str(),
                EventHandler::new(move |event| set_address.set(text_of(event))),
            ))
            .child(greeting.element(Props::new().with("name", name.as_str())))
            .build()
    })
}

#[test]
fn greeting_rerenders_only_when_name_changes() -> Result<()> {
    let renders = Rc::new(Cell::new(0));
    let (mut renderer, root) = mount(form(greeting(&renders)).element(Props::new()));
    let h3 = renderer.host().find_by_tag("h3")[0];
    assert_eq!(renderer.host().text_content(h3), "Hello!");
    assert_eq!(renders.get(), 1);

    let address = renderer.host().find_by_attribute("id", "address").expect("address input");
    dispatch(&mut renderer, address, Event::with_value("change", "Main St"))?;
    assert_eq!(renders.get(), 1, "address edits skip the greeting");
    assert_eq!(
        renderer.host().attribute(address, "value"),
        Some(&PropValue::from("Main St"))
    );

    let name = renderer.host().find_by_attribute("id", "name").expect("name input");
    dispatch(&mut renderer, name, Event::with_value("change", "Ada"))?;
    assert_eq!(renders.get(), 2);
    assert_eq!(renderer.host().text_content(h3), "Hello, Ada!");

    dispatch(&mut renderer, address, Event::with_value("change", "Side St"))?;
    assert_eq!(renders.get(), 2);
    assert_eq!(
        renderer.host().text_content(root),
        "Name: Address: Hello, Ada!"
    );
    Ok(())
}

#[test]
fn broken_component_surfaces_as_facade_error() {
    let broken = Component::new("Broken", |_, _| Element::host("").build());
    let mut renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().root();
    renderer.render(broken.element(Props::new()), root);
    let err: Error = renderer.flush().unwrap_err().into();
    assert!(matches!(err, Error::Element(sprig::ElementError::EmptyTag)));
}
