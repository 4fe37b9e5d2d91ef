use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;
use stache::{
    compile, render, Arguments, Dynamic, Engine, Error, Key, Map, Options, Pipe, Record, Value,
};
use std::{collections::BTreeMap, fmt::Write};

fn helper_render<T>(text: &str, data: &T) -> String
where
    T: Serialize + ?Sized,
{
    render(&compile(text).unwrap(), data).unwrap()
}

#[derive(Debug)]
struct Inventory;

impl Dynamic for Inventory {
    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "apples" => Some(Value::from(3)),
            "pears" => Some(Value::from(0)),
            _ => None,
        }
    }

    fn keys(&self) -> Vec<String> {
        vec!["apples".into(), "pears".into()]
    }
}

#[test]
fn test_literal_passthrough() {
    for text in ["", "plain", "{ single } curly", "}} stray close", "line\nbreak"] {
        assert_eq!(helper_render(text, &json!({"a": 1})), text);
    }
}

#[test]
fn test_escaping() {
    let data = json!({"x": "<b>\"&'`="});

    assert_eq!(
        helper_render("{{x}}", &data),
        "&lt;b&gt;&quot;&amp;&#x27;&#x60;&#x3D;"
    );
    assert_eq!(helper_render("{{{x}}}", &data), "<b>\"&'`=");
}

#[test]
fn test_path_precedence() {
    let data = json!({"names": ["Foo", "Bar"], "map": {"Foo": "X"}});

    assert_eq!(helper_render("{{names.[1]}}{{names.1}}", &data), "BarBar");
    assert_eq!(helper_render("{{map.Foo}}{{map.[Foo]}}", &data), "XX");
}

#[test]
fn test_missing_path_renders_empty() {
    assert_eq!(helper_render("[{{a.b}}]", &json!({})), "[]");
}

#[test]
fn test_truthiness() {
    assert_eq!(helper_render("{{#if 0}}T{{/if}}", &json!({})), "");
    assert_eq!(helper_render("{{#if -0.1}}T{{/if}}", &json!({})), "T");
    assert_eq!(helper_render("{{#if \"\"}}T{{/if}}", &json!({})), "");
    assert_eq!(helper_render("{{#if m}}T{{/if}}", &json!({"m": {}})), "T");
}

#[test]
fn test_each_mapping_order() {
    assert_eq!(
        helper_render(
            "{{#each m}}{{@key}}:{{this}} {{/each}}",
            &json!({"m": {"a": 1, "b": 2}})
        ),
        "a:1 b:2 "
    );
}

#[test]
fn test_with_inversion() {
    let text = "{{#with x}}Y{{else}}N{{/with}}";

    assert_eq!(helper_render(text, &json!({"x": false})), "N");
    assert_eq!(helper_render(text, &json!({"x": []})), "N");
    assert_eq!(helper_render(text, &json!({})), "N");
    assert_eq!(helper_render(text, &json!({"x": {"a": 1}})), "Y");
}

#[test]
fn test_else_if_chain_first_wins() {
    let text = "{{#if a}}A{{else if b}}B{{else}}C{{/if}}";

    assert_eq!(helper_render(text, &json!({"a": true, "b": true})), "A");
    assert_eq!(helper_render(text, &json!({"b": true})), "B");
    assert_eq!(helper_render(text, &json!({})), "C");
}

#[test]
fn test_else_chain_with_other_helpers() {
    let text = "{{#each items}}{{this}}{{else with fallback}}{{name}}{{/each}}";

    assert_eq!(helper_render(text, &json!({"items": [1, 2]})), "12");
    assert_eq!(
        helper_render(text, &json!({"items": [], "fallback": {"name": "none"}})),
        "none"
    );
}

#[test]
fn test_compile_is_idempotent() {
    let text = "{{#each people}}{{name}}{{#if @last}}.{{else}}, {{/if}}{{/each}}";
    let data = json!({"people": [{"name": "a"}, {"name": "b"}]});

    assert_eq!(
        render(&compile(text).unwrap(), &data).unwrap(),
        render(&compile(text).unwrap(), &data).unwrap()
    );
    assert_eq!(helper_render(text, &data), "a, b.");
}

#[test]
fn test_parent_of_this() {
    assert_eq!(
        helper_render(
            "{{#with inner}}{{#with value}}{{../.}}{{/with}}{{/with}}",
            &json!({"inner": {"value": 1}})
        ),
        "{value: 1}"
    );
}

#[test]
fn test_root_inside_iteration() {
    assert_eq!(
        helper_render(
            "{{#each users}}{{name}} in {{@root.group}} {{/each}}",
            &json!({"group": "admins", "users": [{"name": "a"}, {"name": "b"}]})
        ),
        "a in admins b in admins "
    );
}

#[test]
fn test_record_members() {
    #[derive(Serialize)]
    struct Person {
        first: &'static str,
        last: &'static str,
        names: Vec<&'static str>,
    }
    let person = Person {
        first: "Erik",
        last: "Sven",
        names: vec!["one", "two"],
    };

    assert_eq!(helper_render("{{FIRST}} {{names.Length}}", &person), "Erik 2");
    assert_eq!(
        helper_render("{{#each this}}{{#unless @last}}{{@key}}={{this}};{{/unless}}{{/each}}", &person),
        "first=Erik;last=Sven;"
    );
}

#[test]
fn test_integer_keys() {
    let mut small = BTreeMap::new();
    small.insert(42_i32, "int");
    small.insert(7_i32, "seven");
    let mut large = BTreeMap::new();
    large.insert(100_000_000_000_017_i64, "long");

    let data = json!({});
    let engine = Engine::default();
    let template = engine
        .compile("{{small.[42]}} {{large.100000000000017}} {{#each small}}{{@key}}{{/each}}")
        .unwrap();
    let value = Value::from(
        Record::new()
            .with("small", stache::to_value(&small).unwrap())
            .with("large", stache::to_value(&large).unwrap()),
    );

    assert_eq!(engine.render_value(&template, &value).unwrap(), "int long 742");
    assert_eq!(engine.render(&template, &data).unwrap(), "  ");
}

#[test]
fn test_native_map_keys() {
    let map = Map::new().with(Key::I32(1), "one").with("two", "2");
    let value = Value::from(Record::new().with("m", map));
    let engine = Engine::default();
    let template = engine
        .compile("{{#each m}}{{@key}}={{this}} {{/each}}{{m.1}}")
        .unwrap();

    assert_eq!(engine.render_value(&template, &value).unwrap(), "1=one two=2 one");
}

#[test]
fn test_dynamic_objects() {
    let value = Value::from(Record::new().with("stock", Value::dynamic(Inventory)));
    let engine = Engine::default();
    let template = engine
        .compile("{{stock.apples}} {{#each stock}}{{@key}}:{{this}} {{/each}}{{#if stock.pears}}x{{/if}}")
        .unwrap();

    assert_eq!(
        engine.render_value(&template, &value).unwrap(),
        "3 apples:3 pears:0 "
    );
}

#[test]
fn test_negation_with_else() {
    let text = "{{^cond}}no{{else}}yes{{/cond}}";

    assert_eq!(helper_render(text, &json!({"cond": false})), "no");
    assert_eq!(helper_render(text, &json!({"cond": "x"})), "yes");
}

#[test]
fn test_negated_block_inverse_enters_value() {
    #[derive(Serialize)]
    struct Person {
        name: &'static str,
    }
    #[derive(Serialize)]
    struct Data<T> {
        obj: T,
        name: &'static str,
    }

    let template = compile("Hello, {{^obj}}nobody{{else}}{{name}}{{/obj}}!").unwrap();
    let people = vec![
        Person { name: "John" },
        Person { name: " and " },
        Person { name: "Sarah" },
    ];

    assert_eq!(
        render(&template, &Data { obj: people, name: "" }).unwrap(),
        "Hello, John and Sarah!"
    );
    assert_eq!(
        render(&template, &Data { obj: true, name: "somebody" }).unwrap(),
        "Hello, somebody!"
    );
    assert_eq!(
        render(&template, &Data { obj: Person { name: "person" }, name: "" }).unwrap(),
        "Hello, person!"
    );
    assert_eq!(
        render(&template, &Data { obj: false, name: "" }).unwrap(),
        "Hello, nobody!"
    );
}

#[test]
fn test_dictionary_block_iterates() {
    #[derive(Serialize)]
    struct Data {
        #[serde(rename = "ADictionary")]
        dictionary: BTreeMap<&'static str, i32>,
    }

    let dictionary = [("key5", 14), ("key6", 15), ("key7", 16), ("key8", 17)]
        .into_iter()
        .collect();
    let template = compile("{{#ADictionary}}{{@key}},{{this}}{{/ADictionary}}").unwrap();

    assert_eq!(
        render(&template, &Data { dictionary }).unwrap(),
        "key5,14key6,15key7,16key8,17"
    );
}

#[test]
fn test_record_block_enters_record() {
    #[derive(Serialize)]
    struct Person {
        name: &'static str,
    }
    #[derive(Serialize)]
    struct Data {
        person: Person,
    }

    assert_eq!(
        helper_render(
            "{{#person}}{{name}}{{/person}}",
            &Data {
                person: Person { name: "Erik" }
            }
        ),
        "Erik"
    );
}

#[test]
fn test_escaped_backslash_and_empty_comment() {
    assert_eq!(helper_render(r"a\\{{b}}", &json!({"b": "B"})), r"a\B");
    assert_eq!(helper_render("{{!--}}x", &json!({})), "x");
}

#[test]
fn test_escaped_expression() {
    assert_eq!(
        helper_render("\\{{raw_value}} {{raw_value}}", &json!({"raw_value": "v"})),
        "{{raw_value}} v"
    );
}

#[test]
fn test_comments() {
    assert_eq!(
        helper_render("a{{! simple }}b{{!-- has {{ braces }} --}}c", &json!({})),
        "abc"
    );
}

#[test]
fn test_whitespace_control() {
    assert_eq!(
        helper_render("a  {{~x~}}  b\n{{~#if t}} c {{~/if~}} d", &json!({"x": "X", "t": true})),
        "aXb cd"
    );
}

#[test]
fn test_segment_literals() {
    assert_eq!(
        helper_render(
            "{{[my key].[inner key]}} {{person.[last name]}}",
            &json!({"my key": {"inner key": "nested"}, "person": {"last name": "Sven"}})
        ),
        "nested Sven"
    );
}

#[test]
fn test_helper_arguments() {
    fn eval(pipe: &mut Pipe, _: &Value, arguments: &Arguments) -> Result<(), Error> {
        let parts: Vec<_> = arguments
            .positional()
            .iter()
            .map(|value| value.to_text().into_owned())
            .collect();
        write!(pipe, "{}", parts.join(" "))?;

        Ok(())
    }

    let engine = Engine::default().with_helper("eval", eval);
    let template = engine
        .compile("{{eval 2  3}}|{{eval 'a {{b}} c'}}|{{eval missing}}")
        .unwrap();

    assert_eq!(
        engine.render(&template, &json!({})).unwrap(),
        "2 3|a {{b}} c|"
    );
}

#[test]
fn test_custom_block_helper() {
    fn is(pipe: &mut Pipe, options: &Options, _: &Value, arguments: &Arguments) -> Result<(), Error> {
        let (Some(left), Some(right)) = (arguments.get(0), arguments.get(1)) else {
            return Err(Error::build("helper `is` expects two arguments"));
        };
        if left.to_text() == right.to_text() {
            options.render(pipe)
        } else {
            options.inverse(pipe)
        }
    }

    let engine = Engine::default().with_block_helper("is", is);
    let template = engine
        .compile("{{#is ProgramID \"1081\"}}match{{else}}other{{/is}}")
        .unwrap();

    assert_eq!(
        engine.render(&template, &json!({"ProgramID": "1081"})).unwrap(),
        "match"
    );
    assert_eq!(
        engine.render(&template, &json!({"ProgramID": 7})).unwrap(),
        "other"
    );
}

#[test]
fn test_block_helper_hash_and_context() {
    fn wrap(pipe: &mut Pipe, options: &Options, context: &Value, _: &Arguments) -> Result<(), Error> {
        let tag = options.hash().get("tag").map(|tag| tag.to_text().into_owned());
        let tag = tag.unwrap_or_else(|| "div".to_owned());
        write!(pipe, "<{tag}>")?;
        options.render_with(pipe, context)?;
        write!(pipe, "</{tag}>")?;

        Ok(())
    }

    let engine = Engine::default().with_block_helper("wrap", wrap);
    let template = engine
        .compile("{{#wrap tag=\"p\"}}{{name}}{{/wrap}}{{#wrap}}{{name}}{{/wrap}}")
        .unwrap();

    assert_eq!(
        engine.render(&template, &json!({"name": "x"})).unwrap(),
        "<p>x</p><div>x</div>"
    );
}
