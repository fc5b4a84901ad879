mod adapter_plugin_tests;
