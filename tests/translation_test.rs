//! Translation engine tests against POM fixtures and inline descriptors

mod support;

use pom2gradle::gradle::{
    render_build_file, Configuration, Diagnostic, DependencyNotation, Translator,
    BASELINE_VERSION,
};
use pom2gradle::maven::{parse_descriptor, read_descriptor, BuildDescriptor, Dependency, ModuleSet};
use std::path::Path;
use support::fixture_path;
use yare::parameterized;

fn no_modules() -> Vec<String> {
    Vec::new()
}

fn descriptor_with(dependency: Dependency) -> BuildDescriptor {
    let mut descriptor = BuildDescriptor::default();
    descriptor.push_dependency(dependency);
    descriptor
}

#[test]
fn test_unversioned_spring_starter_gets_baseline() {
    let modules = no_modules();
    let descriptor = descriptor_with(Dependency::new(
        "org.springframework.boot",
        "spring-boot-starter-web",
    ));

    let translation = Translator::new(&modules).translate(&descriptor);
    let rendered = render_build_file(&translation.model);

    assert!(rendered.contains("implementation 'org.springframework.boot:spring-boot-starter-web:3.2.5'"));
}

#[test]
fn test_module_dependency_becomes_project_reference() {
    let root = fixture_path("multi-module");
    let modules = ModuleSet::discover(&root).unwrap();
    assert_eq!(modules.names(), ["core".to_string(), "web".to_string()]);

    let web = read_descriptor(&root.join("web").join("pom.xml")).unwrap();
    let translation = Translator::for_modules(&modules).translate(&web);

    let core_dep = &translation.model.dependencies[0];
    assert_eq!(core_dep.configuration, Configuration::Implementation);
    assert_eq!(core_dep.notation, DependencyNotation::Project(":core".to_string()));
    assert!(!render_build_file(&translation.model).contains("com.example:core"));
}

#[test]
fn test_compiler_plugin_levels() {
    let xml = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <build>
    <plugins>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-compiler-plugin</artifactId>
        <configuration>
          <source>17</source>
          <target>17</target>
        </configuration>
      </plugin>
    </plugins>
  </build>
</project>"#;
    let descriptor = parse_descriptor(xml, Path::new("pom.xml")).unwrap();
    let modules = no_modules();

    let model = Translator::new(&modules).translate(&descriptor).model;

    assert_eq!(model.compiler_source_level.as_deref(), Some("17"));
    assert_eq!(model.compiler_target_level.as_deref(), Some("17"));
    let rendered = render_build_file(&model);
    assert!(rendered.contains("sourceCompatibility = '17'"));
    assert!(rendered.contains("targetCompatibility = '17'"));
}

#[parameterized(
    compile = { Some("compile"), "implementation" },
    runtime = { Some("runtime"), "runtimeOnly" },
    test = { Some("test"), "testImplementation" },
    provided = { Some("provided"), "compileOnly" },
    absent = { None, "implementation" },
)]
fn test_scope_mapping(scope: Option<&str>, expected: &str) {
    let mut dependency = Dependency::new("org.example", "lib").with_version("1.0");
    if let Some(scope) = scope {
        dependency = dependency.with_scope(scope);
    }
    let modules = no_modules();

    let model = Translator::new(&modules)
        .translate(&descriptor_with(dependency))
        .model;

    assert_eq!(model.dependencies[0].configuration.to_string(), expected);
}

#[test]
fn test_test_scoped_module_dependency_keeps_configuration() {
    let modules = vec!["core".to_string()];
    let descriptor = descriptor_with(
        Dependency::new("com.example", "core")
            .with_version("1.0.0")
            .with_scope("test"),
    );

    let model = Translator::new(&modules).translate(&descriptor).model;

    assert_eq!(
        render_build_file(&model).lines().find(|l| l.contains("project(")),
        Some("    testImplementation project(':core')")
    );
}

#[test]
fn test_placeholder_resolution() {
    let mut descriptor = descriptor_with(
        Dependency::new("org.example", "lib").with_version("${x}"),
    );
    descriptor
        .properties
        .insert("x".to_string(), "1.2.3".to_string());
    let modules = no_modules();

    let model = Translator::new(&modules).translate(&descriptor).model;
    assert_eq!(
        model.dependencies[0].notation,
        DependencyNotation::Coordinate("org.example:lib:1.2.3".to_string())
    );
}

#[test]
fn test_unresolved_placeholder_falls_back_to_baseline_with_diagnostic() {
    let descriptor = descriptor_with(
        Dependency::new("org.example", "lib").with_version("${missing.version}"),
    );
    let modules = no_modules();

    let translation = Translator::new(&modules).translate(&descriptor);

    assert_eq!(
        translation.model.dependencies[0].notation,
        DependencyNotation::Coordinate(format!("org.example:lib:{}", BASELINE_VERSION))
    );
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::UnresolvedPlaceholder { key, .. } if key == "missing.version")));
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::BaselineVersionApplied { .. })));
}

#[test]
fn test_property_keys_are_sanitized() {
    let descriptor = read_descriptor(&fixture_path("single-module").join("pom.xml")).unwrap();
    let modules = no_modules();

    let model = Translator::new(&modules).translate(&descriptor).model;

    assert!(!model.ext_properties.is_empty());
    for key in model.ext_properties.keys() {
        assert!(!key.contains('.') && !key.contains('-'), "unsanitized key {key}");
    }
    assert_eq!(
        model.ext_properties.get("commons_lang_version").map(String::as_str),
        Some("3.14.0")
    );
}

#[test]
fn test_single_module_fixture_renders_complete_build() {
    let descriptor = read_descriptor(&fixture_path("single-module").join("pom.xml")).unwrap();
    let modules = no_modules();

    let translation = Translator::new(&modules)
        .with_main_class(Some("com.example.shop.ShopApplication".to_string()))
        .translate(&descriptor);
    let rendered = render_build_file(&translation.model);

    assert!(rendered.contains("id 'java'"));
    assert!(rendered.contains("id 'application'"));
    assert!(rendered.contains("id 'org.springframework.boot'\n"));
    assert!(rendered.contains("group = 'com.example'"));
    assert!(rendered.contains("version = '0.0.1-SNAPSHOT'"));
    assert!(rendered.contains("implementation 'org.apache.commons:commons-lang3:3.14.0'"));
    assert!(rendered.contains("runtimeOnly 'org.postgresql:postgresql:42.7.3'"));
    assert!(rendered.contains("compileOnly 'org.projectlombok:lombok:1.18.32'"));
    assert!(rendered.contains("testImplementation 'org.springframework.boot:spring-boot-starter-test:3.2.5'"));
    assert!(rendered.contains("application {\n    mainClass = 'com.example.shop.ShopApplication'\n}"));
    assert!(rendered.contains("springBoot {\n    mainClass = 'com.example.shop.ShopApplication'\n}"));
    assert!(rendered.contains("test {\n    useJUnitPlatform()\n}"));
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::SpringBootUnversioned)));
}

#[test]
fn test_translation_is_idempotent() {
    let descriptor = read_descriptor(&fixture_path("single-module").join("pom.xml")).unwrap();
    let modules = no_modules();
    let translator = Translator::new(&modules);

    let first = render_build_file(&translator.translate(&descriptor).model);
    let second = render_build_file(&translator.translate(&descriptor).model);

    assert_eq!(first, second);
}

#[test]
fn test_manifest_main_class_enables_application_plugin() {
    let root = fixture_path("multi-module");
    let modules = ModuleSet::discover(&root).unwrap();
    let web = read_descriptor(&root.join("web").join("pom.xml")).unwrap();

    let translation = Translator::for_modules(&modules).translate(&web);

    assert_eq!(
        translation.model.application_main_class.as_deref(),
        Some("com.example.web.WebApp")
    );
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::MainClassFromManifest { .. })));
}
